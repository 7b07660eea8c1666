// crates/preimage-worker/src/processor.rs
// ============================================================================
// Module: Unit Processor
// Description: Worker-side processing of one claimed work unit.
// Purpose: Resolve a unit's fingerprints and emit its result envelope.
// Dependencies: preimage-broker, preimage-core
// ============================================================================

//! ## Overview
//! A unit is processed whole or not at all: one batched mapping lookup, an
//! idempotent insert of the hits, then the envelope publish. The surrounding
//! consumer acks only after `process` returns; any error leaves the unit on
//! the bus for redelivery, and because both the result insert and the
//! coordinator's accounting are idempotent, replay is safe.
//! Invariants:
//! - The mapping lookup is one round trip per unit.
//! - An empty unit still emits an (empty) envelope.
//! - Matches are persisted before the envelope is published.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use preimage_broker::HandlerError;
use preimage_broker::MessageHandler;
use preimage_broker::MessageQueue;
use preimage_broker::QueueError;
use preimage_broker::QueueMessage;
use preimage_broker::QueueName;
use preimage_broker::SharedQueue;
use preimage_core::JobStore;
use preimage_core::MappingStore;
use preimage_core::ResultEnvelope;
use preimage_core::SharedJobStore;
use preimage_core::SharedMappingStore;
use preimage_core::StoreError;
use preimage_core::WorkUnit;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Processor Errors
// ============================================================================

/// Errors returned while processing one work unit.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Mapping lookup or result insertion failed.
    #[error("unit store failure: {0}")]
    Store(#[from] StoreError),
    /// Envelope publication failed.
    #[error("unit publish failure: {0}")]
    Publish(#[from] QueueError),
}

// ============================================================================
// SECTION: Unit Processor
// ============================================================================

/// Worker-side service resolving claimed work units.
pub struct UnitProcessor {
    /// Store receiving discovered results.
    jobs: SharedJobStore,
    /// Read-only precomputed mapping.
    mapping: SharedMappingStore,
    /// Bus used to publish result envelopes.
    queue: SharedQueue,
}

impl UnitProcessor {
    /// Creates the processor.
    #[must_use]
    pub fn new(jobs: SharedJobStore, mapping: SharedMappingStore, queue: SharedQueue) -> Self {
        Self {
            jobs,
            mapping,
            queue,
        }
    }

    /// Processes one work unit to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError`] on any failure; the caller must leave the
    /// unit unacked so the bus redelivers it.
    pub fn process(&self, unit: &WorkUnit) -> Result<(), ProcessError> {
        let matches = if unit.fingerprints.is_empty() {
            Vec::new()
        } else {
            self.mapping.lookup(&unit.fingerprints)?
        };
        if !matches.is_empty() {
            self.jobs.insert_results(&unit.job_id, &matches)?;
        }
        debug!(
            job_id = %unit.job_id,
            batch_index = unit.batch_index,
            looked_up = unit.fingerprints.len(),
            found = matches.len(),
            "unit processed"
        );
        let envelope = ResultEnvelope {
            job_id: unit.job_id,
            batch_index: unit.batch_index,
            matches,
        };
        self.queue
            .publish_message(QueueName::Results, &QueueMessage::ResultEnvelope(envelope))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Handler Adapter
// ============================================================================

/// Wraps a processor as a `work`-queue message handler.
///
/// A result envelope on the work queue is a handler error and stays on the
/// bus.
#[must_use]
pub fn work_handler(processor: Arc<UnitProcessor>) -> Arc<MessageHandler> {
    Arc::new(move |message: &QueueMessage| match message {
        QueueMessage::WorkUnit(unit) => processor.process(unit).map_err(HandlerError::from),
        other => Err(format!("unexpected {} message on work queue", other.kind()).into()),
    })
}
