//! Trigger handling for fired alarms
//!
//! A single background worker drains the alarm signal channel, so
//! store reads and re-registrations never run on the task that
//! delivered the firing. Failures are logged and stop only the
//! current firing's chain; they are never silently swallowed and
//! never retried.

use chrono::Utc;
use sndp_common::db::profiles;
use sndp_common::events::{EventBus, SndpEvent};
use sndp_common::params::PARAMS;
use sndp_common::SoundProfile;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::alarm::AlarmSignal;
use crate::mixer::{apply_profile, Mixer};
use crate::scheduler::ProfileScheduler;
use crate::Result;

pub struct TriggerHandler {
    db: SqlitePool,
    mixer: Arc<dyn Mixer>,
    scheduler: Arc<ProfileScheduler>,
    bus: EventBus,
}

impl TriggerHandler {
    pub fn new(
        db: SqlitePool,
        mixer: Arc<dyn Mixer>,
        scheduler: Arc<ProfileScheduler>,
        bus: EventBus,
    ) -> Self {
        Self {
            db,
            mixer,
            scheduler,
            bus,
        }
    }

    /// Start the worker draining the alarm signal channel
    ///
    /// Runs until the channel closes (alarm service dropped).
    pub fn spawn(self, mut rx: mpsc::UnboundedReceiver<AlarmSignal>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Trigger handler worker started");
            while let Some(signal) = rx.recv().await {
                if let Err(e) = self.handle(signal).await {
                    error!(
                        profile_id = signal.profile_id,
                        reset = signal.reset_to_default,
                        "Trigger handling failed: {}",
                        e
                    );
                }
            }
            info!("Trigger handler worker stopped");
        })
    }

    /// Process one fired signal
    pub async fn handle(&self, signal: AlarmSignal) -> Result<()> {
        if signal.reset_to_default {
            self.reset_to_default(signal.profile_id).await
        } else {
            self.apply(signal.profile_id).await
        }
    }

    /// Window start: apply the profile's levels
    ///
    /// A profile deleted between scheduling and firing is a graceful
    /// no-op, not a fault.
    async fn apply(&self, profile_id: i64) -> Result<()> {
        let profile = match profiles::get_by_id(&self.db, profile_id).await {
            Ok(profile) => profile,
            Err(sndp_common::Error::NotFound(_)) => {
                warn!(profile_id, "Apply fired for a deleted profile, skipping");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        apply_profile(self.mixer.as_ref(), &profile);
        self.bus
            .emit(SndpEvent::ProfileApplied {
                profile_id,
                title: profile.title.clone(),
                timestamp: Utc::now(),
            })
            .ok();

        Ok(())
    }

    /// Window end: restore default levels, then advance the series
    ///
    /// The default is the configured default profile when set and
    /// still present, otherwise the implicit full-volume fallback.
    /// The reschedule always targets the ORIGINAL profile's id so its
    /// series continues.
    async fn reset_to_default(&self, profile_id: i64) -> Result<()> {
        let configured = PARAMS.default_profile_id();
        let (default_profile, applied_default_id) = match configured {
            Some(default_id) => match profiles::get_by_id(&self.db, default_id).await {
                Ok(profile) => (profile, Some(default_id)),
                Err(sndp_common::Error::NotFound(_)) => {
                    warn!(
                        default_id,
                        "Configured default profile missing, using fallback"
                    );
                    (SoundProfile::default_fallback(), None)
                }
                Err(e) => return Err(e.into()),
            },
            None => (SoundProfile::default_fallback(), None),
        };

        apply_profile(self.mixer.as_ref(), &default_profile);
        self.bus
            .emit(SndpEvent::VolumesReset {
                profile_id,
                default_profile_id: applied_default_id,
                timestamp: Utc::now(),
            })
            .ok();

        match self.scheduler.reschedule(profile_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(profile_id, "Reset fired for a deleted profile, series ends");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmService;
    use crate::mixer::SoftMixer;
    use chrono::{Duration, Timelike};
    use serial_test::serial;
    use sndp_common::db::init::create_sound_profiles_table;
    use sndp_common::volume::Stream;
    use sndp_common::Day;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_sound_profiles_table(&pool).await.unwrap();
        pool
    }

    fn quiet_profile(repeat_everyday: bool, repeat_days: Vec<Day>) -> SoundProfile {
        let start = (Utc::now() + Duration::hours(1)).with_nanosecond(0).unwrap();
        SoundProfile {
            id: 0,
            title: "Quiet Hours".to_string(),
            description: String::new(),
            media_volume: 0.2,
            notification_volume: 0.0,
            ringer_volume: 0.0,
            call_volume: 0.6,
            alarm_volume: 0.4,
            start_time: start,
            end_time: start + Duration::hours(8),
            is_active: true,
            repeat_everyday,
            repeat_days,
        }
    }

    struct Fixture {
        db: SqlitePool,
        mixer: Arc<SoftMixer>,
        handler: TriggerHandler,
    }

    async fn setup() -> Fixture {
        let db = setup_test_db().await;
        let (alarms, _rx) = AlarmService::new();
        let bus = EventBus::new(64);
        let mixer = Arc::new(SoftMixer::new());
        let scheduler = Arc::new(ProfileScheduler::new(
            db.clone(),
            alarms,
            bus.clone(),
        ));
        let handler = TriggerHandler::new(
            db.clone(),
            mixer.clone() as Arc<dyn Mixer>,
            scheduler,
            bus,
        );
        Fixture { db, mixer, handler }
    }

    #[tokio::test]
    #[serial]
    async fn test_apply_signal_pushes_profile_levels() {
        let fixture = setup().await;
        let mut profile = quiet_profile(true, Vec::new());
        profile.id = profiles::insert(&fixture.db, &profile).await.unwrap();

        fixture
            .handler
            .handle(AlarmSignal {
                profile_id: profile.id,
                reset_to_default: false,
            })
            .await
            .unwrap();

        assert_eq!(fixture.mixer.stream_level(Stream::Media), 3); // 0.2 * 15
        assert_eq!(fixture.mixer.stream_level(Stream::Ring), 0);
        assert_eq!(fixture.mixer.stream_level(Stream::Call), 9); // 0.6 * 15
    }

    #[tokio::test]
    #[serial]
    async fn test_apply_for_deleted_profile_is_noop() {
        let fixture = setup().await;

        fixture
            .handler
            .handle(AlarmSignal {
                profile_id: 12345,
                reset_to_default: false,
            })
            .await
            .unwrap();

        // Mixer untouched: still at initial full volume.
        assert_eq!(fixture.mixer.stream_level(Stream::Media), 15);
    }

    #[tokio::test]
    #[serial]
    async fn test_reset_without_configured_default_uses_fallback() {
        let fixture = setup().await;
        PARAMS.set_default_profile_id(None);

        let mut profile = quiet_profile(true, Vec::new());
        profile.id = profiles::insert(&fixture.db, &profile).await.unwrap();

        // Window is active: profile levels currently applied.
        apply_profile(fixture.mixer.as_ref(), &profile);
        assert_eq!(fixture.mixer.stream_level(Stream::Ring), 0);

        fixture
            .handler
            .handle(AlarmSignal {
                profile_id: profile.id,
                reset_to_default: true,
            })
            .await
            .unwrap();

        // Fallback restored everything to full volume.
        for stream in Stream::ALL {
            assert_eq!(fixture.mixer.stream_level(stream), 15);
        }

        // And the series advanced by one day.
        let advanced = profiles::get_by_id(&fixture.db, profile.id).await.unwrap();
        assert_eq!(advanced.start_time, profile.start_time + Duration::days(1));
    }

    #[tokio::test]
    #[serial]
    async fn test_reset_applies_configured_default_profile() {
        let fixture = setup().await;

        let mut half = quiet_profile(false, Vec::new());
        half.title = "Half Volume".to_string();
        half.media_volume = 0.5;
        half.notification_volume = 0.5;
        half.ringer_volume = 0.5;
        half.call_volume = 0.5;
        half.alarm_volume = 0.5;
        let default_id = profiles::insert(&fixture.db, &half).await.unwrap();
        PARAMS.set_default_profile_id(Some(default_id));

        let mut profile = quiet_profile(true, Vec::new());
        profile.id = profiles::insert(&fixture.db, &profile).await.unwrap();

        fixture
            .handler
            .handle(AlarmSignal {
                profile_id: profile.id,
                reset_to_default: true,
            })
            .await
            .unwrap();

        // 0.5 * 15 truncates to 7 on every stream.
        for stream in Stream::ALL {
            assert_eq!(fixture.mixer.stream_level(stream), 7);
        }

        PARAMS.set_default_profile_id(None);
    }

    #[tokio::test]
    #[serial]
    async fn test_reset_with_missing_default_falls_back() {
        let fixture = setup().await;
        PARAMS.set_default_profile_id(Some(9999));

        let mut profile = quiet_profile(true, Vec::new());
        profile.id = profiles::insert(&fixture.db, &profile).await.unwrap();

        fixture
            .handler
            .handle(AlarmSignal {
                profile_id: profile.id,
                reset_to_default: true,
            })
            .await
            .unwrap();

        for stream in Stream::ALL {
            assert_eq!(fixture.mixer.stream_level(stream), 15);
        }

        PARAMS.set_default_profile_id(None);
    }

    #[tokio::test]
    #[serial]
    async fn test_reset_for_deleted_profile_still_restores_default() {
        let fixture = setup().await;
        PARAMS.set_default_profile_id(None);

        fixture
            .handler
            .handle(AlarmSignal {
                profile_id: 777,
                reset_to_default: true,
            })
            .await
            .unwrap();

        // Default restored even though the reschedule found nothing.
        for stream in Stream::ALL {
            assert_eq!(fixture.mixer.stream_level(stream), 15);
        }
    }
}
