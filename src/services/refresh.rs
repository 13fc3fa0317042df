// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh coordinator: one timer slot plus the in-flight refresh guard.
//!
//! Timer lifecycle for an accepted token:
//! - more than `guard` lifetime left: Deferred, wake up when `guard` is left
//! - otherwise: Armed, fire at `expires_at - lead` (immediately if past)
//! - fired: the slot detaches and the callback runs the refresh
//!
//! Re-arming always aborts the previous timer first, so at most one future
//! refresh is ever scheduled.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::time_utils::Clock;

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No timer (no session, or session just cleared)
    Idle,
    /// Token still fresh; waiting until the guard window before arming
    Deferred,
    /// Refresh timer scheduled
    Armed,
    /// Refresh call in flight
    Refreshing,
}

/// Result of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New tokens accepted
    Refreshed,
    /// The session changed while waiting or while the call was out
    Superseded,
    /// No tokens to refresh
    NoSession,
    /// Refresh rejected or unusable; the session was cleared
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPhase {
    Idle,
    Deferred,
    Armed,
}

struct TimerSlot {
    id: u64,
    phase: TimerPhase,
    handle: Option<JoinHandle<()>>,
}

type SharedSlot = Arc<Mutex<TimerSlot>>;

fn lock_slot(slot: &SharedSlot) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}

/// Schedules refreshes and serializes refresh calls.
pub struct RefreshCoordinator {
    lead: Duration,
    guard: Duration,
    slot: SharedSlot,
    next_id: AtomicU64,
    in_flight: tokio::sync::Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(lead: Duration, guard: Duration) -> Self {
        Self {
            lead,
            guard: guard.max(lead),
            slot: Arc::new(Mutex::new(TimerSlot {
                id: 0,
                phase: TimerPhase::Idle,
                handle: None,
            })),
            next_id: AtomicU64::new(1),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    pub fn lead(&self) -> Duration {
        self.lead
    }

    pub fn guard(&self) -> Duration {
        self.guard
    }

    pub fn state(&self) -> RefreshState {
        if self.in_flight.try_lock().is_err() {
            return RefreshState::Refreshing;
        }
        match lock_slot(&self.slot).phase {
            TimerPhase::Idle => RefreshState::Idle,
            TimerPhase::Deferred => RefreshState::Deferred,
            TimerPhase::Armed => RefreshState::Armed,
        }
    }

    /// Claim the in-flight guard without waiting.
    ///
    /// `None` means a refresh is already running.
    pub fn try_begin(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        self.in_flight.try_lock().ok()
    }

    /// Claim the in-flight guard, waiting for a running refresh to finish.
    pub async fn begin(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.in_flight.lock().await
    }

    /// Replace any pending timer with one for a token expiring at
    /// `expires_at_ms`; `on_fire` runs once the refresh point is reached.
    pub fn schedule<F, Fut>(&self, expires_at_ms: i64, clock: Arc<dyn Clock>, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let lead_ms = self.lead.as_millis() as i64;
        let guard_ms = self.guard.as_millis() as i64;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut slot = lock_slot(&self.slot);
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }

        let remaining = expires_at_ms - clock.now_ms();
        slot.id = id;
        slot.phase = if remaining > guard_ms {
            TimerPhase::Deferred
        } else {
            TimerPhase::Armed
        };
        tracing::debug!(
            remaining_ms = remaining,
            phase = ?slot.phase,
            "Refresh timer scheduled"
        );

        let shared = Arc::clone(&self.slot);
        slot.handle = Some(tokio::spawn(async move {
            loop {
                let remaining = expires_at_ms - clock.now_ms();
                if remaining > guard_ms {
                    set_phase(&shared, id, TimerPhase::Deferred);
                    tokio::time::sleep(millis(remaining - guard_ms)).await;
                    continue;
                }
                set_phase(&shared, id, TimerPhase::Armed);
                tokio::time::sleep(millis(remaining - lead_ms)).await;
                break;
            }

            // Detach before running, so the refresh re-arming the slot
            // cannot abort the task it is running on.
            {
                let mut slot = lock_slot(&shared);
                if slot.id != id {
                    return;
                }
                slot.handle = None;
                slot.phase = TimerPhase::Idle;
            }

            on_fire().await;
        }));
    }

    /// Abort any pending timer.
    pub fn cancel(&self) {
        let mut slot = lock_slot(&self.slot);
        if let Some(handle) = slot.handle.take() {
            handle.abort();
            tracing::debug!("Refresh timer cancelled");
        }
        slot.phase = TimerPhase::Idle;
        slot.id = self.next_id.fetch_add(1, Ordering::Relaxed);
    }
}

fn set_phase(slot: &SharedSlot, id: u64, phase: TimerPhase) {
    let mut slot = lock_slot(slot);
    if slot.id == id {
        slot.phase = phase;
    }
}

impl Drop for RefreshCoordinator {
    fn drop(&mut self) {
        if let Some(handle) = lock_slot(&self.slot).handle.take() {
            handle.abort();
        }
    }
}
