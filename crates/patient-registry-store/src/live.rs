// crates/patient-registry-store/src/live.rs
// ============================================================================
// Module: Live Query Subscriptions
// Description: Push channel registry for subscribed SQL queries.
// Purpose: Re-deliver fresh result sets to subscribers after every mutation.
// Dependencies: crate::value, std::sync::mpsc
// ============================================================================

//! ## Overview
//! A live query is a SQL text plus parameter tuple registered with the store.
//! After every committed mutation the store re-runs each registered query and
//! pushes the fresh result set through the subscription's channel. Dropping a
//! [`LiveSubscription`] unsubscribes it; senders whose receiver disappeared
//! are pruned during the next notification pass. No subscription is ever
//! shared between handles, so one handle never sees overlapping streams.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::value::ParamValue;
use crate::value::QueryOutcome;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// A registered live query awaiting pushes.
#[derive(Debug)]
pub(crate) struct LiveEntry {
    /// Subscription identifier.
    pub(crate) id: u64,
    /// SQL text re-run on every mutation.
    pub(crate) sql: String,
    /// Positional parameters bound on every re-run.
    pub(crate) params: Vec<ParamValue>,
    /// Push channel into the subscription.
    pub(crate) sender: Sender<QueryOutcome>,
}

/// Registry of live queries owned by the store.
///
/// # Invariants
/// - Entry identifiers are unique for the registry's lifetime.
#[derive(Debug, Default)]
pub(crate) struct LiveRegistry {
    /// Registered entries.
    entries: Mutex<Vec<LiveEntry>>,
    /// Next subscription identifier.
    next_id: AtomicU64,
}

impl LiveRegistry {
    /// Registers a query and returns the subscription identifier and receiver.
    pub(crate) fn register(
        &self,
        sql: String,
        params: Vec<ParamValue>,
    ) -> (u64, Receiver<QueryOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(LiveEntry {
            id,
            sql,
            params,
            sender,
        });
        (id, receiver)
    }

    /// Removes a subscription by identifier.
    pub(crate) fn remove(&self, id: u64) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|entry| entry.id != id);
    }

    /// Pushes an outcome to one subscription; returns `false` when it is gone.
    pub(crate) fn push(&self, id: u64, outcome: QueryOutcome) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .find(|entry| entry.id == id)
            .is_some_and(|entry| entry.sender.send(outcome).is_ok())
    }

    /// Returns a snapshot of live entries for a notification pass.
    pub(crate) fn snapshot(&self) -> Vec<(u64, String, Vec<ParamValue>)> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .iter()
            .map(|entry| (entry.id, entry.sql.clone(), entry.params.clone()))
            .collect()
    }

    /// Drops entries whose receivers have disconnected.
    pub(crate) fn prune(&self, dead: &[u64]) {
        if dead.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|entry| !dead.contains(&entry.id));
    }

    /// Returns the number of registered subscriptions.
    pub(crate) fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.len()
    }
}

// ============================================================================
// SECTION: Subscription Handle
// ============================================================================

/// Handle to one live query; dropping it unsubscribes.
///
/// # Invariants
/// - Exactly one receiver per registered query; no overlapping streams.
#[derive(Debug)]
pub struct LiveSubscription {
    /// Subscription identifier inside the registry.
    id: u64,
    /// Push channel from the store.
    receiver: Receiver<QueryOutcome>,
    /// Registry back-reference for unsubscribe-on-drop.
    registry: Weak<LiveRegistry>,
}

impl LiveSubscription {
    /// Builds a subscription handle over a registered entry.
    pub(crate) const fn new(
        id: u64,
        receiver: Receiver<QueryOutcome>,
        registry: Weak<LiveRegistry>,
    ) -> Self {
        Self {
            id,
            receiver,
            registry,
        }
    }

    /// Returns the next pushed result set without blocking.
    #[must_use]
    pub fn try_next(&self) -> Option<QueryOutcome> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next pushed result set.
    #[must_use]
    pub fn next_timeout(&self, timeout: Duration) -> Option<QueryOutcome> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Drains all pending pushes and returns the most recent one.
    #[must_use]
    pub fn latest(&self) -> Option<QueryOutcome> {
        let mut latest = None;
        while let Ok(outcome) = self.receiver.try_recv() {
            latest = Some(outcome);
        }
        latest
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
