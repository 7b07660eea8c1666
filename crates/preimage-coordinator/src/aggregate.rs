// crates/preimage-coordinator/src/aggregate.rs
// ============================================================================
// Module: Result Aggregation
// Description: Applies worker result envelopes to job state.
// Purpose: Advance job counters idempotently and emit progress events.
// Dependencies: preimage-broker, preimage-core
// ============================================================================

//! ## Overview
//! The aggregator drains the `results` queue. Each envelope advances its
//! job's counters through the store's single-transaction accounting, which
//! records the batch in the processed ledger first; a replayed envelope is
//! therefore a no-op rather than a double count. Envelopes for unknown jobs
//! are dropped silently. Events are emitted after the transaction commits,
//! in the aggregator's local order, with `completed` exactly once per job.
//! Invariants:
//! - Counters never advance twice for one `(job, batch_index)` pair.
//! - A store failure leaves the envelope on the bus for redelivery.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use preimage_broker::HandlerError;
use preimage_broker::MessageHandler;
use preimage_broker::QueueMessage;
use preimage_core::JobEvent;
use preimage_core::JobStore;
use preimage_core::ProgressOutcome;
use preimage_core::ResultEnvelope;
use preimage_core::SharedJobStore;
use preimage_core::StoreError;
use tracing::debug;
use tracing::info;

use crate::events::EventHub;

// ============================================================================
// SECTION: Result Aggregator
// ============================================================================

/// Coordinator-side aggregation of worker result envelopes.
pub struct ResultAggregator {
    /// Durable job store.
    store: SharedJobStore,
    /// Subscriber fan-out for lifecycle events.
    hub: Arc<EventHub>,
}

impl ResultAggregator {
    /// Creates the aggregator.
    #[must_use]
    pub fn new(store: SharedJobStore, hub: Arc<EventHub>) -> Self {
        Self {
            store,
            hub,
        }
    }

    /// Applies one result envelope to its job.
    ///
    /// Unknown jobs and replayed batches are dropped without effect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the accounting transaction fails; the
    /// caller leaves the envelope on the bus for redelivery.
    pub fn apply(&self, envelope: &ResultEnvelope) -> Result<(), StoreError> {
        let found = envelope.matches.len() as u64;
        match self.store.apply_envelope(&envelope.job_id, envelope.batch_index, found)? {
            ProgressOutcome::UnknownJob => {
                debug!(job_id = %envelope.job_id, "dropping envelope for unknown job");
                Ok(())
            }
            ProgressOutcome::DuplicateBatch => {
                debug!(
                    job_id = %envelope.job_id,
                    batch_index = envelope.batch_index,
                    "dropping replayed envelope"
                );
                Ok(())
            }
            ProgressOutcome::Advanced(progress) => {
                self.hub.publish(&envelope.job_id, JobEvent::Progress {
                    batches_completed: progress.batches_completed,
                    batches_expected: progress.batches_expected,
                    found_count: progress.found_count,
                });
                if progress.newly_completed {
                    info!(job_id = %envelope.job_id, found = progress.found_count, "job completed");
                    self.hub.publish(&envelope.job_id, JobEvent::Completed {
                        job_id: envelope.job_id,
                    });
                    self.hub.complete(&envelope.job_id);
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SECTION: Handler Adapter
// ============================================================================

/// Wraps an aggregator as a `results`-queue message handler.
///
/// A work unit on the results queue is a handler error and stays on the bus.
#[must_use]
pub fn results_handler(aggregator: Arc<ResultAggregator>) -> Arc<MessageHandler> {
    Arc::new(move |message: &QueueMessage| match message {
        QueueMessage::ResultEnvelope(envelope) => {
            aggregator.apply(envelope).map_err(HandlerError::from)
        }
        other => Err(format!("unexpected {} message on results queue", other.kind()).into()),
    })
}
