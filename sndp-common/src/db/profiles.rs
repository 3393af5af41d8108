//! Sound profile database access
//!
//! CRUD queries over the sound_profiles table. Rows are mapped by hand
//! because repeat_days round-trips through a JSON TEXT column.

use crate::db::models::SoundProfile;
use crate::error::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn profile_from_row(row: &SqliteRow) -> Result<SoundProfile> {
    let repeat_days_json: String = row.get("repeat_days");
    Ok(SoundProfile {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        media_volume: row.get("media_volume"),
        notification_volume: row.get("notification_volume"),
        ringer_volume: row.get("ringer_volume"),
        call_volume: row.get("call_volume"),
        alarm_volume: row.get("alarm_volume"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        is_active: row.get("is_active"),
        repeat_everyday: row.get("repeat_everyday"),
        repeat_days: serde_json::from_str(&repeat_days_json)?,
    })
}

/// Get all profiles, oldest first
pub async fn get_all(db: &SqlitePool) -> Result<Vec<SoundProfile>> {
    let rows = sqlx::query("SELECT * FROM sound_profiles ORDER BY id")
        .fetch_all(db)
        .await?;

    rows.iter().map(profile_from_row).collect()
}

/// Get all profiles with a registered schedule
pub async fn get_active(db: &SqlitePool) -> Result<Vec<SoundProfile>> {
    let rows = sqlx::query("SELECT * FROM sound_profiles WHERE is_active = 1 ORDER BY id")
        .fetch_all(db)
        .await?;

    rows.iter().map(profile_from_row).collect()
}

/// Get a profile by id
pub async fn get_by_id(db: &SqlitePool, id: i64) -> Result<SoundProfile> {
    let row = sqlx::query("SELECT * FROM sound_profiles WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("sound profile {}", id)))?;

    profile_from_row(&row)
}

/// Find profiles whose title matches a LIKE pattern
pub async fn find_by_title(db: &SqlitePool, title: &str) -> Result<Vec<SoundProfile>> {
    let rows = sqlx::query("SELECT * FROM sound_profiles WHERE title LIKE ? ORDER BY id")
        .bind(title)
        .fetch_all(db)
        .await?;

    rows.iter().map(profile_from_row).collect()
}

/// Find profiles whose description matches a LIKE pattern
pub async fn find_by_description(db: &SqlitePool, description: &str) -> Result<Vec<SoundProfile>> {
    let rows = sqlx::query("SELECT * FROM sound_profiles WHERE description LIKE ? ORDER BY id")
        .bind(description)
        .fetch_all(db)
        .await?;

    rows.iter().map(profile_from_row).collect()
}

/// Insert a new profile, returning the generated id
///
/// The profile's own `id` field is ignored (rowid assignment is the
/// database's).
pub async fn insert(db: &SqlitePool, profile: &SoundProfile) -> Result<i64> {
    let repeat_days = serde_json::to_string(&profile.repeat_days)?;
    let result = sqlx::query(
        r#"
        INSERT INTO sound_profiles
            (title, description, media_volume, notification_volume, ringer_volume,
             call_volume, alarm_volume, start_time, end_time, is_active,
             repeat_everyday, repeat_days)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.title)
    .bind(&profile.description)
    .bind(profile.media_volume)
    .bind(profile.notification_volume)
    .bind(profile.ringer_volume)
    .bind(profile.call_volume)
    .bind(profile.alarm_volume)
    .bind(profile.start_time)
    .bind(profile.end_time)
    .bind(profile.is_active)
    .bind(profile.repeat_everyday)
    .bind(repeat_days)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert several profiles in one transaction
pub async fn insert_all(db: &SqlitePool, profiles: &[SoundProfile]) -> Result<Vec<i64>> {
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let repeat_days = serde_json::to_string(&profile.repeat_days)?;
        let result = sqlx::query(
            r#"
            INSERT INTO sound_profiles
                (title, description, media_volume, notification_volume, ringer_volume,
                 call_volume, alarm_volume, start_time, end_time, is_active,
                 repeat_everyday, repeat_days)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.title)
        .bind(&profile.description)
        .bind(profile.media_volume)
        .bind(profile.notification_volume)
        .bind(profile.ringer_volume)
        .bind(profile.call_volume)
        .bind(profile.alarm_volume)
        .bind(profile.start_time)
        .bind(profile.end_time)
        .bind(profile.is_active)
        .bind(profile.repeat_everyday)
        .bind(repeat_days)
        .execute(&mut *tx)
        .await?;
        ids.push(result.last_insert_rowid());
    }
    tx.commit().await?;

    Ok(ids)
}

/// Replace the row matching `profile.id`
pub async fn update(db: &SqlitePool, profile: &SoundProfile) -> Result<()> {
    let repeat_days = serde_json::to_string(&profile.repeat_days)?;
    let result = sqlx::query(
        r#"
        UPDATE sound_profiles SET
            title = ?, description = ?, media_volume = ?, notification_volume = ?,
            ringer_volume = ?, call_volume = ?, alarm_volume = ?, start_time = ?,
            end_time = ?, is_active = ?, repeat_everyday = ?, repeat_days = ?
        WHERE id = ?
        "#,
    )
    .bind(&profile.title)
    .bind(&profile.description)
    .bind(profile.media_volume)
    .bind(profile.notification_volume)
    .bind(profile.ringer_volume)
    .bind(profile.call_volume)
    .bind(profile.alarm_volume)
    .bind(profile.start_time)
    .bind(profile.end_time)
    .bind(profile.is_active)
    .bind(profile.repeat_everyday)
    .bind(repeat_days)
    .bind(profile.id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("sound profile {}", profile.id)));
    }

    Ok(())
}

/// Set only the is_active flag
pub async fn set_active(db: &SqlitePool, id: i64, active: bool) -> Result<()> {
    sqlx::query("UPDATE sound_profiles SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

/// Delete a profile by id (no-op when absent)
pub async fn delete_by_id(db: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM sound_profiles WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(())
}

/// Delete all profiles
pub async fn delete_all(db: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM sound_profiles").execute(db).await?;

    Ok(())
}
