//! Profile scheduling orchestration
//!
//! Bridges the occurrence calculator to the alarm registry and the
//! profile store. Each scheduled profile owns two registrations: an
//! Apply alarm at window start and a Reset alarm at window end. When
//! the Reset alarm fires, the trigger handler calls [`ProfileScheduler::reschedule`]
//! to advance the series and re-register both alarms, so a repeating
//! profile keeps firing indefinitely.

use chrono::{Datelike, Utc};
use sndp_common::db::profiles;
use sndp_common::events::{EventBus, SndpEvent};
use sndp_common::occurrence;
use sndp_common::{Day, SoundProfile};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::alarm::{AlarmService, AlarmSignal, AlarmToken};
use crate::error::{Error, Result};

pub struct ProfileScheduler {
    db: SqlitePool,
    alarms: Arc<AlarmService>,
    bus: EventBus,
}

impl ProfileScheduler {
    pub fn new(db: SqlitePool, alarms: Arc<AlarmService>, bus: EventBus) -> Self {
        Self { db, alarms, bus }
    }

    /// Register both alarms for a profile's current window
    ///
    /// Refuses with CapabilityDenied when exact wake-capable delivery
    /// is not granted; callers are expected to check
    /// [`ProfileScheduler::has_exact_alarm_capability`] first and
    /// obtain the grant before retrying. Does not touch `is_active`;
    /// that flag is the caller's to flip.
    pub fn schedule(&self, profile: &SoundProfile) -> Result<()> {
        if !self.alarms.has_exact_capability() {
            return Err(Error::CapabilityDenied(format!(
                "cannot schedule profile '{}'",
                profile.title
            )));
        }

        self.alarms.register_exact_wake(
            profile.start_time,
            AlarmToken::apply(profile.id),
            AlarmSignal {
                profile_id: profile.id,
                reset_to_default: false,
            },
        );
        self.alarms.register_exact_wake(
            profile.end_time,
            AlarmToken::reset(profile.id),
            AlarmSignal {
                profile_id: profile.id,
                reset_to_default: true,
            },
        );

        info!(
            profile_id = profile.id,
            title = %profile.title,
            start = %profile.start_time,
            end = %profile.end_time,
            "Profile scheduled"
        );
        self.bus
            .emit(SndpEvent::ProfileScheduled {
                profile_id: profile.id,
                title: profile.title.clone(),
                start_time: profile.start_time,
                end_time: profile.end_time,
                timestamp: Utc::now(),
            })
            .ok();

        Ok(())
    }

    /// Unregister both alarms for a profile
    ///
    /// Idempotent: canceling a profile with no pending registrations
    /// is a no-op. Does not recall a firing already in flight.
    pub fn cancel(&self, profile: &SoundProfile) {
        self.alarms.cancel(AlarmToken::apply(profile.id));
        self.alarms.cancel(AlarmToken::reset(profile.id));

        info!(
            profile_id = profile.id,
            title = %profile.title,
            "Profile schedule canceled"
        );
        self.bus
            .emit(SndpEvent::ProfileCanceled {
                profile_id: profile.id,
                title: profile.title.clone(),
                timestamp: Utc::now(),
            })
            .ok();
    }

    /// Advance a profile's series after its window ended
    ///
    /// Loads the profile, computes the next occurrence against today's
    /// weekday, persists the rewritten row and re-registers both
    /// alarms. A one-shot profile has no next occurrence: its series
    /// ends, `is_active` is cleared and nothing is re-registered.
    /// That is a normal terminal state, not a failure.
    pub async fn reschedule(&self, profile_id: i64) -> Result<()> {
        let profile = profiles::get_by_id(&self.db, profile_id).await?;
        let today = Day::from_weekday(Utc::now().weekday());

        match occurrence::compute_next(today, &profile) {
            Some(next) => {
                profiles::update(&self.db, &next).await?;
                self.schedule(&next)?;
                self.bus
                    .emit(SndpEvent::ScheduleAdvanced {
                        profile_id,
                        next_start: next.start_time,
                        next_end: next.end_time,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
            None => {
                profiles::set_active(&self.db, profile_id, false).await?;
                info!(profile_id, "One-shot window ended, series complete");
                self.bus
                    .emit(SndpEvent::ScheduleEnded {
                        profile_id,
                        timestamp: Utc::now(),
                    })
                    .ok();
            }
        }

        Ok(())
    }

    /// Re-register alarms for every profile marked active
    ///
    /// Pending registrations do not survive a process restart, unlike
    /// the store's `is_active` flags; this replays them at startup.
    /// Returns the number of profiles re-registered.
    pub async fn restore_schedules(&self) -> Result<usize> {
        if !self.alarms.has_exact_capability() {
            warn!("Exact alarm capability not granted, skipping schedule restore");
            return Ok(0);
        }

        let active = profiles::get_active(&self.db).await?;
        let count = active.len();
        for profile in &active {
            self.schedule(profile)?;
        }
        if count > 0 {
            info!("Restored {} active profile schedule(s)", count);
        }
        Ok(count)
    }

    /// Whether exact wake-capable alarm delivery is granted
    pub fn has_exact_alarm_capability(&self) -> bool {
        self.alarms.has_exact_capability()
    }
}
