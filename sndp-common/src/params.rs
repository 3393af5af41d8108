//! Global parameter management
//!
//! A single process-wide slot for the default profile id, with
//! explicit get/set and database-backed persistence. Read-frequently,
//! write-rarely access pattern using RwLock.
//!
//! The slot is deliberately initialized to "unset": until the user
//! picks a default, the end-of-window reset falls back to the implicit
//! full-volume profile.

use crate::db::settings;
use crate::Result;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use std::sync::RwLock;
use tracing::info;

/// Global parameters singleton
///
/// Initialized once from the database, accessed everywhere.
pub static PARAMS: Lazy<GlobalParams> = Lazy::new(GlobalParams::default);

/// Global parameter storage
#[derive(Default)]
pub struct GlobalParams {
    /// Configured default profile id; None = unset
    default_profile_id: RwLock<Option<i64>>,
}

impl GlobalParams {
    /// Read the default profile id slot
    pub fn default_profile_id(&self) -> Option<i64> {
        *self
            .default_profile_id
            .read()
            .expect("default_profile_id lock poisoned")
    }

    /// Write the default profile id slot (in-memory only)
    pub fn set_default_profile_id(&self, id: Option<i64>) {
        *self
            .default_profile_id
            .write()
            .expect("default_profile_id lock poisoned") = id;
    }
}

/// Load the slot from the settings table at startup
pub async fn init_from_db(db: &SqlitePool) -> Result<()> {
    let id = settings::get_default_profile_id(db).await?;
    PARAMS.set_default_profile_id(id);
    match id {
        Some(id) => info!("Default profile id loaded: {}", id),
        None => info!("Default profile id unset"),
    }
    Ok(())
}

/// Update the slot and persist it in the same call
pub async fn set_and_persist(db: &SqlitePool, id: Option<i64>) -> Result<()> {
    match id {
        Some(id) => settings::set_default_profile_id(db, id).await?,
        None => settings::clear_default_profile_id(db).await?,
    }
    PARAMS.set_default_profile_id(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_settings_table;
    use serial_test::serial;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_settings_table(&pool).await.unwrap();
        pool
    }

    // The PARAMS singleton is process-wide state, so these tests are
    // serialized.

    #[tokio::test]
    #[serial]
    async fn test_slot_starts_unset_after_init_on_fresh_db() {
        let db = setup_test_db().await;
        init_from_db(&db).await.unwrap();
        assert_eq!(PARAMS.default_profile_id(), None);
    }

    #[tokio::test]
    #[serial]
    async fn test_set_and_persist_round_trips_through_db() {
        let db = setup_test_db().await;

        set_and_persist(&db, Some(3)).await.unwrap();
        assert_eq!(PARAMS.default_profile_id(), Some(3));

        // A fresh init from the same database restores the slot.
        PARAMS.set_default_profile_id(None);
        init_from_db(&db).await.unwrap();
        assert_eq!(PARAMS.default_profile_id(), Some(3));

        set_and_persist(&db, None).await.unwrap();
        assert_eq!(PARAMS.default_profile_id(), None);
        assert_eq!(
            settings::get_default_profile_id(&db).await.unwrap(),
            None
        );
    }
}
