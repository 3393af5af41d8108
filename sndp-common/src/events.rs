//! Event types for the SNDP event system
//!
//! User-visible confirmations (profile scheduled / canceled / applied)
//! and schedule lifecycle notifications are broadcast on the EventBus
//! and can be serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// SNDP event types
///
/// Events are broadcast via EventBus and serialized for SSE
/// transmission to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SndpEvent {
    /// Both alarms for a profile were registered
    ///
    /// Triggers:
    /// - SSE: Show the scheduling confirmation
    ProfileScheduled {
        profile_id: i64,
        title: String,
        /// Instant the apply alarm fires
        start_time: DateTime<Utc>,
        /// Instant the reset alarm fires
        end_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Both alarms for a profile were unregistered
    ///
    /// Triggers:
    /// - SSE: Show the cancellation confirmation
    ProfileCanceled {
        profile_id: i64,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A profile's volume levels were pushed to the mixer
    ///
    /// Emitted both for alarm-driven applies and manual apply-now
    /// requests.
    ProfileApplied {
        profile_id: i64,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// A window ended and the default levels were restored
    ///
    /// `default_profile_id` is None when the implicit full-volume
    /// fallback was used instead of a configured default profile.
    VolumesReset {
        /// Profile whose window just ended
        profile_id: i64,
        default_profile_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },

    /// A repeating profile advanced to its next occurrence
    ///
    /// Triggers:
    /// - SSE: Refresh the schedule display
    ScheduleAdvanced {
        profile_id: i64,
        next_start: DateTime<Utc>,
        next_end: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// A one-shot profile's window ended and its series is over
    ScheduleEnded {
        profile_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// The configured default profile changed (None = cleared)
    DefaultProfileChanged {
        default_profile_id: Option<i64>,
        timestamp: DateTime<Utc>,
    },
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally: non-blocking publish, multiple
/// concurrent subscribers, automatic cleanup when subscribers drop,
/// lagged-message detection for slow subscribers.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SndpEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// Capacity bounds how many events a slow subscriber may lag
    /// before it starts losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SndpEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` when no subscriber is
    /// listening; callers that only emit confirmations ignore that
    /// case.
    pub fn emit(
        &self,
        event: SndpEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<SndpEvent>> {
        self.tx.send(event)
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
