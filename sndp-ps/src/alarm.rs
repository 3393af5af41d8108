//! Exact wake-capable alarm registry
//!
//! One-shot timer registrations keyed per profile, delivered as
//! signals on an mpsc channel. Each profile owns at most two
//! registrations (apply at window start, reset at window end);
//! re-registering a token replaces the pending registration, and
//! cancellation is an idempotent no-op for absent tokens.
//!
//! Delivery semantics: a registration fires at or after its instant
//! (immediately for instants already in the past) and is removed once
//! fired. There is no delivery deadline and no retry.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Which of a profile's two alarms a token names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    /// Fires at window start: apply the profile
    Apply,
    /// Fires at window end: reset to default, then advance the series
    Reset,
}

/// Unique registration key: one per (profile, kind) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlarmToken {
    pub profile_id: i64,
    pub kind: AlarmKind,
}

impl AlarmToken {
    pub fn apply(profile_id: i64) -> Self {
        Self {
            profile_id,
            kind: AlarmKind::Apply,
        }
    }

    pub fn reset(profile_id: i64) -> Self {
        Self {
            profile_id,
            kind: AlarmKind::Reset,
        }
    }
}

/// Payload delivered when a registration fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSignal {
    pub profile_id: i64,
    /// True for end-of-window firings: reset to default and advance
    pub reset_to_default: bool,
}

/// In-process alarm facility
///
/// Signals are delivered on the channel handed out by [`AlarmService::new`];
/// the trigger handler drains it on its own worker so registrations
/// never block on downstream work.
pub struct AlarmService {
    pending: Mutex<HashMap<AlarmToken, (u64, JoinHandle<()>)>>,
    next_generation: AtomicU64,
    tx: mpsc::UnboundedSender<AlarmSignal>,
    exact_capability: AtomicBool,
}

impl AlarmService {
    /// Create the service and the signal channel it delivers on
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<AlarmSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Arc::new(Self {
            pending: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            tx,
            exact_capability: AtomicBool::new(true),
        });
        (service, rx)
    }

    /// Register a one-shot signal at (or after) the given instant
    ///
    /// An existing registration under the same token is replaced.
    /// Instants in the past fire immediately.
    pub fn register_exact_wake(
        self: &Arc<Self>,
        trigger_at: DateTime<Utc>,
        token: AlarmToken,
        signal: AlarmSignal,
    ) {
        let delay = (trigger_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

        // Hold the registry lock across the spawn so the new entry is
        // in place before a zero-delay firing can try to remove it.
        let mut pending = self.pending.lock().expect("alarm registry poisoned");

        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(
                profile_id = signal.profile_id,
                reset = signal.reset_to_default,
                "alarm fired"
            );
            // Receiver gone means the service is shutting down.
            service.tx.send(signal).ok();

            let mut pending = service.pending.lock().expect("alarm registry poisoned");
            // Only remove our own registration; the token may have
            // been re-registered while this firing was in flight.
            if pending.get(&token).map(|(gen, _)| *gen) == Some(generation) {
                pending.remove(&token);
            }
        });

        if let Some((_, old)) = pending.insert(token, (generation, handle)) {
            old.abort();
            debug!(?token, "replaced pending alarm registration");
        }
    }

    /// Remove a pending registration; no-op if absent
    pub fn cancel(&self, token: AlarmToken) {
        let removed = {
            let mut pending = self.pending.lock().expect("alarm registry poisoned");
            pending.remove(&token)
        };
        if let Some((_, handle)) = removed {
            handle.abort();
            debug!(?token, "canceled pending alarm registration");
        }
    }

    /// Whether exact wake-capable delivery is currently granted
    ///
    /// Always true unless the gate has been revoked (platforms that do
    /// not gate the capability leave it granted).
    pub fn has_exact_capability(&self) -> bool {
        self.exact_capability.load(Ordering::SeqCst)
    }

    /// Grant or revoke the exact-alarm capability gate
    pub fn set_exact_capability(&self, granted: bool) {
        self.exact_capability.store(granted, Ordering::SeqCst);
    }

    /// Number of registrations currently pending
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("alarm registry poisoned").len()
    }
}
