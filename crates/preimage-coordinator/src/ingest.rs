// crates/preimage-coordinator/src/ingest.rs
// ============================================================================
// Module: Job Ingestion
// Description: Upload admission, partitioning, persistence, and dispatch.
// Purpose: Turn an uploaded file into a persisted job with enqueued units.
// Dependencies: preimage-broker, preimage-core, chrono
// ============================================================================

//! ## Overview
//! Ingestion admits fingerprints from the uploaded text, persists the job
//! row and its collapsed target set in one transaction, then publishes one
//! work unit per partition. Publishing happens outside the transaction: a
//! crash between commit and the last publish leaves the job partially
//! dispatched, and the bus replays nothing on the coordinator's behalf.
//! Invariants:
//! - The job row exists before any target row or work unit.
//! - `batches_expected` equals the number of units published for the job.
//! - A job with no admitted fingerprints is terminal at creation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use chrono::Utc;
use preimage_broker::MessageQueue;
use preimage_broker::QueueError;
use preimage_broker::QueueMessage;
use preimage_broker::QueueName;
use preimage_broker::SharedQueue;
use preimage_core::JobEvent;
use preimage_core::JobId;
use preimage_core::JobRecord;
use preimage_core::JobStatus;
use preimage_core::JobStore;
use preimage_core::SharedJobStore;
use preimage_core::StoreError;
use preimage_core::batches_for;
use preimage_core::partition_units;
use preimage_core::targets::admit_targets;
use thiserror::Error;
use tracing::info;

use crate::events::EventHub;

// ============================================================================
// SECTION: Ingest Errors
// ============================================================================

/// Errors returned by job ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Job or target persistence failed.
    #[error("ingest store failure: {0}")]
    Store(#[from] StoreError),
    /// Work unit publication failed after the job row was committed.
    #[error("ingest publish failure: {0}")]
    Publish(#[from] QueueError),
}

// ============================================================================
// SECTION: Job Intake
// ============================================================================

/// Ingestion service owned by the coordinator.
pub struct JobIntake {
    /// Durable job store.
    store: SharedJobStore,
    /// Bus used to publish work units.
    queue: SharedQueue,
    /// Subscriber fan-out for lifecycle events.
    hub: Arc<EventHub>,
    /// Maximum fingerprints per work unit.
    partition_size: usize,
}

impl JobIntake {
    /// Creates the intake service.
    #[must_use]
    pub fn new(
        store: SharedJobStore,
        queue: SharedQueue,
        hub: Arc<EventHub>,
        partition_size: usize,
    ) -> Self {
        Self {
            store,
            queue,
            hub,
            partition_size,
        }
    }

    /// Creates a job from uploaded line-delimited text.
    ///
    /// Returns the new job identifier once every work unit is durably
    /// enqueued. Malformed lines are silently discarded; an upload that
    /// admits nothing yields an empty job that is terminal at creation.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] when persistence fails (nothing was
    /// enqueued) and [`IngestError::Publish`] when a unit fails to enqueue
    /// after the job row was committed (the job is stranded; no compensation
    /// is performed).
    pub fn create_job(&self, upload: &str) -> Result<JobId, IngestError> {
        let admitted = admit_targets(upload);
        let job_id = JobId::generate();
        let total_hashes = admitted.len() as u64;
        let batches_expected = batches_for(total_hashes, self.partition_size as u64);
        let status =
            if batches_expected == 0 { JobStatus::Completed } else { JobStatus::Running };
        let record = JobRecord {
            job_id,
            created_at: Utc::now(),
            status,
            total_hashes,
            batches_expected,
            batches_completed: 0,
            found_count: 0,
        };
        self.store.create_job(&record, &admitted)?;
        for unit in partition_units(job_id, &admitted, self.partition_size) {
            self.queue.publish_message(QueueName::Work, &QueueMessage::WorkUnit(unit))?;
        }
        info!(
            job_id = %job_id,
            total_hashes,
            batches_expected,
            "job created"
        );
        self.hub.publish(&job_id, JobEvent::JobCreated {
            job_id,
        });
        if batches_expected == 0 {
            self.hub.publish(&job_id, JobEvent::Completed {
                job_id,
            });
            self.hub.complete(&job_id);
        }
        Ok(job_id)
    }
}
