//! Database initialization
//!
//! Creates the database on first run, enables WAL mode, and seeds
//! default settings. Safe to call on every startup (all statements are
//! idempotent).

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: readers stay concurrent with the single writer, which
    // matters when a fired trigger rewrites a row while the API reads.
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_sound_profiles_table(&pool).await?;
    create_settings_table(&pool).await?;

    init_default_settings(&pool).await?;

    Ok(pool)
}

/// Create the sound_profiles table
///
/// One row per profile. Volume levels are fractions in [0.0, 1.0],
/// repeat_days is a JSON array of weekday names.
pub async fn create_sound_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sound_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            media_volume REAL NOT NULL CHECK (media_volume >= 0.0 AND media_volume <= 1.0),
            notification_volume REAL NOT NULL CHECK (notification_volume >= 0.0 AND notification_volume <= 1.0),
            ringer_volume REAL NOT NULL CHECK (ringer_volume >= 0.0 AND ringer_volume <= 1.0),
            call_volume REAL NOT NULL CHECK (call_volume >= 0.0 AND call_volume <= 1.0),
            alarm_volume REAL NOT NULL CHECK (alarm_volume >= 0.0 AND alarm_volume <= 1.0),
            start_time TIMESTAMP NOT NULL,
            end_time TIMESTAMP NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0,
            repeat_everyday INTEGER NOT NULL DEFAULT 0,
            repeat_days TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sound_profiles_title ON sound_profiles(title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sound_profiles_active ON sound_profiles(is_active)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize default settings
///
/// `default_profile_id` is deliberately not seeded: the slot stays
/// unset until the user picks a default profile.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "exact_alarms_enabled", "true").await?;
    ensure_setting(pool, "event_bus_capacity", "256").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // INSERT OR IGNORE handles concurrent initialization races.
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?;

    Ok(())
}
