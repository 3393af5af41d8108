//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are global/system-wide.

use crate::error::{Error, Result};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Settings key for the configured default profile id
pub const DEFAULT_PROFILE_ID: &str = "default_profile_id";

/// Settings key for the exact-alarm capability gate
pub const EXACT_ALARMS_ENABLED: &str = "exact_alarms_enabled";

/// Settings key for the event bus channel capacity
pub const EVENT_BUS_CAPACITY: &str = "event_bus_capacity";

/// Get the configured default profile id
///
/// None means the slot was never set (or was cleared): the implicit
/// full-volume fallback applies when a window ends.
pub async fn get_default_profile_id(db: &SqlitePool) -> Result<Option<i64>> {
    get_setting::<i64>(db, DEFAULT_PROFILE_ID).await
}

/// Set the configured default profile id
pub async fn set_default_profile_id(db: &SqlitePool, id: i64) -> Result<()> {
    set_setting(db, DEFAULT_PROFILE_ID, id).await
}

/// Clear the configured default profile id
pub async fn clear_default_profile_id(db: &SqlitePool) -> Result<()> {
    delete_setting(db, DEFAULT_PROFILE_ID).await
}

/// Whether exact wake-capable alarm registration is granted
pub async fn get_exact_alarms_enabled(db: &SqlitePool) -> Result<bool> {
    Ok(get_setting::<bool>(db, EXACT_ALARMS_ENABLED)
        .await?
        .unwrap_or(true))
}

/// Grant or revoke the exact-alarm capability
pub async fn set_exact_alarms_enabled(db: &SqlitePool, enabled: bool) -> Result<()> {
    set_setting(db, EXACT_ALARMS_ENABLED, enabled).await
}

/// Event bus channel capacity (default 256 when unset)
pub async fn get_event_bus_capacity(db: &SqlitePool) -> Result<usize> {
    Ok(get_setting::<usize>(db, EVENT_BUS_CAPACITY)
        .await?
        .unwrap_or(256))
}

/// Generic setting getter
///
/// Returns None if the key doesn't exist. Parses the stored string
/// using FromStr.
pub async fn get_setting<T: FromStr>(db: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T: ToString>(db: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

/// Remove a setting entirely (no-op when absent)
pub async fn delete_setting(db: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;

    Ok(())
}
