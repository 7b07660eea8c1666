// crates/preimage-coordinator/src/events.rs
// ============================================================================
// Module: Event Hub
// Description: Process-wide registry of per-job event subscribers.
// Purpose: Fan lifecycle events out to at most one live stream per job.
// Dependencies: preimage-core, tokio
// ============================================================================

//! ## Overview
//! The hub maps each job to at most one subscriber, represented by a bounded
//! channel sender; the HTTP layer drains the matching receiver into an event
//! stream. Delivery is best-effort: publishing with no subscriber drops the
//! event, a failed or backed-up send evicts the subscriber, and a new
//! subscription for the same job replaces the old one, closing its stream.
//! Invariants:
//! - At most one subscriber is registered per job at any time.
//! - Evicted and completed subscribers observe end-of-stream, not an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use preimage_core::JobEvent;
use preimage_core::JobId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

// ============================================================================
// SECTION: Event Hub
// ============================================================================

/// Events buffered per subscriber before it counts as backed up.
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Process-wide registry of per-job event subscribers.
#[derive(Debug, Default)]
pub struct EventHub {
    /// Subscriber senders keyed by job.
    subscribers: Mutex<HashMap<JobId, Sender<JobEvent>>>,
}

impl EventHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber for a job, replacing any prior one.
    ///
    /// The replaced subscriber's sender is dropped, which ends its stream
    /// cleanly.
    #[must_use]
    pub fn subscribe(&self, job_id: JobId) -> Receiver<JobEvent> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(job_id, tx);
        }
        rx
    }

    /// Sends one event to the job's subscriber, if any.
    ///
    /// A full or closed channel evicts the subscriber; an absent subscriber
    /// drops the event.
    pub fn publish(&self, job_id: &JobId, event: JobEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        let Some(sender) = subscribers.get(job_id) else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => {
                debug!(job_id = %job_id, "evicting unresponsive event subscriber");
                subscribers.remove(job_id);
            }
        }
    }

    /// Closes the job's stream cleanly and removes its subscriber.
    pub fn complete(&self, job_id: &JobId) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.remove(job_id);
        }
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map_or(0, |subscribers| subscribers.len())
    }
}
