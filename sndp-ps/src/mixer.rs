//! Mixer abstraction over the platform audio subsystem
//!
//! The scheduler core only needs two operations per stream: query the
//! native step range, and set a level. Profiles store fractional
//! levels, so every apply converts through the shared formula in
//! sndp-common::volume.

use serde::Serialize;
use sndp_common::volume::{fraction_to_steps, steps_to_fraction, Stream, StreamRange};
use sndp_common::SoundProfile;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// Narrow audio-subsystem interface the scheduler core depends on
pub trait Mixer: Send + Sync {
    /// Native integer step range for a stream
    fn stream_range(&self, stream: Stream) -> StreamRange;

    /// Set a stream to a native step level
    fn set_stream_level(&self, stream: Stream, steps: i32);

    /// Current native step level of a stream
    fn stream_level(&self, stream: Stream) -> i32;
}

/// One stream's current state, as reported by the API
#[derive(Debug, Clone, Serialize)]
pub struct StreamLevel {
    pub stream: Stream,
    pub steps: i32,
    pub fraction: f32,
}

/// In-process mixer
///
/// Holds the current level of each stream behind a RwLock. All
/// streams share one step range and start at full volume.
pub struct SoftMixer {
    range: StreamRange,
    levels: RwLock<HashMap<Stream, i32>>,
}

impl SoftMixer {
    /// Default native range, fifteen steps above zero
    pub const DEFAULT_RANGE: StreamRange = StreamRange { min: 0, max: 15 };

    pub fn new() -> Self {
        Self::with_range(Self::DEFAULT_RANGE)
    }

    pub fn with_range(range: StreamRange) -> Self {
        let levels = Stream::ALL.iter().map(|s| (*s, range.max)).collect();
        Self {
            range,
            levels: RwLock::new(levels),
        }
    }

    /// Current state of all five streams, in column order
    pub fn snapshot(&self) -> Vec<StreamLevel> {
        let levels = self.levels.read().expect("mixer state poisoned");
        Stream::ALL
            .iter()
            .map(|stream| {
                let steps = levels.get(stream).copied().unwrap_or(self.range.max);
                StreamLevel {
                    stream: *stream,
                    steps,
                    fraction: steps_to_fraction(steps, self.range),
                }
            })
            .collect()
    }
}

impl Default for SoftMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mixer for SoftMixer {
    fn stream_range(&self, _stream: Stream) -> StreamRange {
        self.range
    }

    fn set_stream_level(&self, stream: Stream, steps: i32) {
        let steps = steps.clamp(self.range.min, self.range.max);
        self.levels
            .write()
            .expect("mixer state poisoned")
            .insert(stream, steps);
    }

    fn stream_level(&self, stream: Stream) -> i32 {
        self.levels
            .read()
            .expect("mixer state poisoned")
            .get(&stream)
            .copied()
            .unwrap_or(self.range.max)
    }
}

/// Push a profile's five levels to the mixer
pub fn apply_profile(mixer: &dyn Mixer, profile: &SoundProfile) {
    let volumes = profile.volumes();
    for stream in Stream::ALL {
        let range = mixer.stream_range(stream);
        let steps = fraction_to_steps(volumes.level(stream), range);
        mixer.set_stream_level(stream, steps);
    }
    info!(
        profile_id = profile.id,
        title = %profile.title,
        "Applied profile volume levels"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_levels(media: f32, ring: f32) -> SoundProfile {
        let mut profile = SoundProfile::default_fallback();
        profile.id = 1;
        profile.title = "Test Profile".to_string();
        profile.media_volume = media;
        profile.notification_volume = 0.5;
        profile.ringer_volume = ring;
        profile.call_volume = 0.5;
        profile.alarm_volume = 0.5;
        profile
    }

    #[test]
    fn test_mixer_starts_at_full_volume() {
        let mixer = SoftMixer::new();
        for stream in Stream::ALL {
            assert_eq!(mixer.stream_level(stream), 15);
        }
    }

    #[test]
    fn test_apply_profile_converts_fractions_to_steps() {
        let mixer = SoftMixer::new();
        apply_profile(&mixer, &profile_with_levels(0.0, 1.0));

        assert_eq!(mixer.stream_level(Stream::Media), 0);
        assert_eq!(mixer.stream_level(Stream::Ring), 15);
        // 0.5 * 15 truncates to 7.
        assert_eq!(mixer.stream_level(Stream::Notification), 7);
    }

    #[test]
    fn test_apply_respects_nonzero_minimum_range() {
        let mixer = SoftMixer::with_range(StreamRange::new(1, 7));
        apply_profile(&mixer, &profile_with_levels(0.0, 1.0));

        assert_eq!(mixer.stream_level(Stream::Media), 1);
        assert_eq!(mixer.stream_level(Stream::Ring), 7);
    }

    #[test]
    fn test_set_stream_level_clamps_to_range() {
        let mixer = SoftMixer::new();
        mixer.set_stream_level(Stream::Alarm, 99);
        assert_eq!(mixer.stream_level(Stream::Alarm), 15);
        mixer.set_stream_level(Stream::Alarm, -3);
        assert_eq!(mixer.stream_level(Stream::Alarm), 0);
    }

    #[test]
    fn test_snapshot_reports_all_streams() {
        let mixer = SoftMixer::new();
        apply_profile(&mixer, &profile_with_levels(0.2, 0.8));

        let snapshot = mixer.snapshot();
        assert_eq!(snapshot.len(), 5);
        let media = snapshot
            .iter()
            .find(|l| l.stream == Stream::Media)
            .unwrap();
        assert_eq!(media.steps, 3);
        assert!((media.fraction - 0.2).abs() <= 1.0 / 15.0);
    }
}
