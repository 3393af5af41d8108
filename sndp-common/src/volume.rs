//! Stream volume model and level conversion
//!
//! Profiles store each stream level as a fraction in [0.0, 1.0]; the
//! mixer operates on native integer steps within a per-stream range.
//! Conversion in both directions lives here so every consumer agrees
//! on the formula.

use serde::{Deserialize, Serialize};

/// The five audio streams a profile controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Media,
    Notification,
    Ring,
    Call,
    Alarm,
}

impl Stream {
    /// All streams, in profile column order
    pub const ALL: [Stream; 5] = [
        Stream::Media,
        Stream::Notification,
        Stream::Ring,
        Stream::Call,
        Stream::Alarm,
    ];

    /// Stable lowercase name, used in API payloads and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Media => "media",
            Stream::Notification => "notification",
            Stream::Ring => "ring",
            Stream::Call => "call",
            Stream::Alarm => "alarm",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native integer step range for one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRange {
    pub min: i32,
    pub max: i32,
}

impl StreamRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Number of steps between min and max
    pub fn span(&self) -> i32 {
        self.max - self.min
    }
}

/// Convert a fractional level in [0.0, 1.0] to native steps
///
/// Out-of-range fractions are clamped before conversion.
pub fn fraction_to_steps(fraction: f32, range: StreamRange) -> i32 {
    let fraction = fraction.clamp(0.0, 1.0);
    (fraction * range.span() as f32) as i32 + range.min
}

/// Convert native steps back to a fractional level
///
/// A degenerate range (min == max) maps everything to 1.0.
pub fn steps_to_fraction(steps: i32, range: StreamRange) -> f32 {
    if range.span() <= 0 {
        return 1.0;
    }
    ((steps - range.min) as f32 / range.span() as f32).clamp(0.0, 1.0)
}

/// Per-stream fractional levels of one profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeLevels {
    pub media: f32,
    pub notification: f32,
    pub ring: f32,
    pub call: f32,
    pub alarm: f32,
}

impl VolumeLevels {
    /// Uniform levels across all five streams
    pub fn uniform(level: f32) -> Self {
        let level = level.clamp(0.0, 1.0);
        Self {
            media: level,
            notification: level,
            ring: level,
            call: level,
            alarm: level,
        }
    }

    pub fn level(&self, stream: Stream) -> f32 {
        match stream {
            Stream::Media => self.media,
            Stream::Notification => self.notification,
            Stream::Ring => self.ring,
            Stream::Call => self.call,
            Stream::Alarm => self.alarm,
        }
    }
}
