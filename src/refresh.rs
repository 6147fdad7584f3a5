//! Last-triggered-wins publication of refresh results.
//!
//! Every refresh takes a ticket from `begin()` before it starts fetching.
//! When it finishes it hands its result to `publish()`, which only
//! accepts it if no newer refresh has been started since. Results of
//! superseded refreshes are dropped, so rapid repeated triggers can never
//! leave an older snapshot on display after a newer one was requested.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Generation handed out by `RefreshCoordinator::begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// A published snapshot and the generation that produced it.
#[derive(Debug)]
pub struct Published<T> {
    pub generation: u64,
    pub value: Arc<T>,
}

impl<T> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            value: Arc::clone(&self.value),
        }
    }
}

#[derive(Debug)]
pub struct RefreshCoordinator<T> {
    started: AtomicU64,
    slot: Mutex<Option<Published<T>>>,
}

impl<T> Default for RefreshCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RefreshCoordinator<T> {
    pub fn new() -> Self {
        Self {
            started: AtomicU64::new(0),
            slot: Mutex::new(None),
        }
    }

    /// Starts a new refresh, superseding every refresh begun before it.
    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.started.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Generation of the most recently begun refresh (0 if none).
    pub fn current_generation(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Ticket of the most recently begun refresh, if any.
    pub fn current_ticket(&self) -> Option<RefreshTicket> {
        match self.current_generation() {
            0 => None,
            generation => Some(RefreshTicket(generation)),
        }
    }

    /// Generation of the published snapshot (0 if none).
    pub fn published_generation(&self) -> u64 {
        self.lock_slot().as_ref().map_or(0, |p| p.generation)
    }

    /// True while no newer refresh has been begun.
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        ticket.0 == self.current_generation()
    }

    /// Stores `value` if `ticket` is still the newest refresh.
    /// Returns `false` when the result was discarded as superseded.
    pub fn publish(&self, ticket: RefreshTicket, value: T) -> bool {
        let mut slot = self.lock_slot();

        if !self.is_current(ticket) {
            tracing::debug!(
                generation = ticket.0,
                latest = self.current_generation(),
                "discarding superseded refresh result"
            );
            return false;
        }
        if slot.as_ref().is_some_and(|p| p.generation >= ticket.0) {
            return false;
        }

        *slot = Some(Published {
            generation: ticket.0,
            value: Arc::new(value),
        });
        true
    }

    /// Most recently published snapshot, if any.
    pub fn latest(&self) -> Option<Published<T>> {
        self.lock_slot().clone()
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Published<T>>> {
        // the slot is only ever replaced wholesale, poisoning is harmless
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
