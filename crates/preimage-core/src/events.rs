// crates/preimage-core/src/events.rs
// ============================================================================
// Module: Job Events
// Description: Typed lifecycle events streamed to job subscribers.
// Purpose: Carry ingestion, progress, and completion notifications.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Events are serialized as `{"type": ..., "payload": ...}` objects, the wire
//! shape consumed by event-stream subscribers. Delivery is best-effort:
//! events published with no live subscriber are dropped, and subscribers
//! reconcile by fetching job status on (re)connect.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::JobId;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Lifecycle event for one job.
///
/// # Invariants
/// - For a given job, `JobCreated` precedes every `Progress`, and
///   `Completed` is last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum JobEvent {
    /// A job was created and its units enqueued.
    JobCreated {
        /// Identifier of the new job.
        job_id: JobId,
    },
    /// One result envelope was aggregated.
    Progress {
        /// Batches aggregated so far.
        batches_completed: u64,
        /// Fixed batch count for the job.
        batches_expected: u64,
        /// Running match total.
        found_count: u64,
    },
    /// Every expected batch has been aggregated.
    Completed {
        /// Identifier of the finished job.
        job_id: JobId,
    },
}

impl JobEvent {
    /// Returns the wire discriminator for this event.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JobCreated {
                ..
            } => "job_created",
            Self::Progress {
                ..
            } => "progress",
            Self::Completed {
                ..
            } => "completed",
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
