//! Database models

use crate::error::{Error, Result};
use crate::volume::VolumeLevels;
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Weekday tags, Sunday-first (ordinal 0 = Sunday .. 6 = Saturday)
///
/// The ordinal matches chrono's `num_days_from_sunday` numbering, so
/// conversions between the two never need an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Day {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    /// All days in ordinal order
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    /// Sunday-first ordinal (0..=6)
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Day for a Sunday-first ordinal; None outside 0..=6
    pub fn from_index(index: u8) -> Option<Day> {
        Day::ALL.get(index as usize).copied()
    }

    pub fn from_weekday(weekday: Weekday) -> Day {
        match weekday {
            Weekday::Sun => Day::Sunday,
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
        }
    }
}

/// A named bundle of per-stream volume levels plus a time window and
/// repeat policy.
///
/// `start_time`/`end_time` are absolute instants. For one-shot
/// profiles they define the single window; for repeating profiles only
/// their time-of-day is meaningful and the date components drift
/// forward as the occurrence calculator advances the series. The same
/// row is rewritten in place on each advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundProfile {
    /// Row id; 0 means "not yet persisted"
    pub id: i64,
    pub title: String,
    pub description: String,
    pub media_volume: f32,
    pub notification_volume: f32,
    pub ringer_volume: f32,
    pub call_volume: f32,
    pub alarm_volume: f32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// True while a schedule is registered for this profile
    pub is_active: bool,
    pub repeat_everyday: bool,
    /// Weekdays to repeat on; ignored when `repeat_everyday` is set
    pub repeat_days: Vec<Day>,
}

impl SoundProfile {
    /// The implicit fallback applied when a window ends and no default
    /// profile has been configured: 100% on all five streams.
    pub fn default_fallback() -> SoundProfile {
        let now = Utc::now();
        SoundProfile {
            id: 0,
            title: "Default".to_string(),
            description: String::new(),
            media_volume: 1.0,
            notification_volume: 1.0,
            ringer_volume: 1.0,
            call_volume: 1.0,
            alarm_volume: 1.0,
            start_time: now,
            end_time: now,
            is_active: false,
            repeat_everyday: false,
            repeat_days: Vec::new(),
        }
    }

    /// The five stream levels of this profile
    pub fn volumes(&self) -> VolumeLevels {
        VolumeLevels {
            media: self.media_volume,
            notification: self.notification_volume,
            ring: self.ringer_volume,
            call: self.call_volume,
            alarm: self.alarm_volume,
        }
    }

    /// Validate user-editable fields before persisting
    ///
    /// Title must be non-empty; all five levels must lie in [0.0, 1.0].
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        let levels = [
            ("media_volume", self.media_volume),
            ("notification_volume", self.notification_volume),
            ("ringer_volume", self.ringer_volume),
            ("call_volume", self.call_volume),
            ("alarm_volume", self.alarm_volume),
        ];
        for (name, level) in levels {
            if !(0.0..=1.0).contains(&level) {
                return Err(Error::InvalidInput(format!(
                    "{} must be within [0.0, 1.0], got {}",
                    name, level
                )));
            }
        }
        Ok(())
    }
}
