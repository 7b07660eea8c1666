// crates/preimage-core/src/job.rs
// ============================================================================
// Module: Job State
// Description: Job lifecycle records and progress accounting.
// Purpose: Model the coordinator-owned job state advanced by result batches.
// Dependencies: chrono, serde
// ============================================================================

//! ## Overview
//! A job is created at ingestion with a fixed target set and batch count, and
//! is advanced exclusively by the coordinator's aggregator as result
//! envelopes arrive.
//! Invariants:
//! - `batches_expected = ceil(total_hashes / partition_size)` for the life of
//!   the job.
//! - `0 <= batches_completed <= batches_expected`.
//! - A job that reaches [`JobStatus::Completed`] never reverts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::JobId;

// ============================================================================
// SECTION: Job Status
// ============================================================================

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Work units are outstanding.
    Running,
    /// All expected batches have been observed.
    Completed,
}

impl JobStatus {
    /// Returns the persisted label for this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parses a persisted status label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Job Record
// ============================================================================

/// Full job row as persisted and served over the status API.
///
/// # Invariants
/// - Serialized field names are the public wire contract; do not rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Job identifier.
    pub job_id: JobId,
    /// Creation instant (UTC).
    pub created_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Count of admitted fingerprints, duplicates included.
    pub total_hashes: u64,
    /// Number of work units dispatched for this job.
    pub batches_expected: u64,
    /// Number of distinct result envelopes aggregated so far.
    pub batches_completed: u64,
    /// Running total of matches across aggregated envelopes.
    pub found_count: u64,
}

impl JobRecord {
    /// Returns true when every expected batch has been aggregated.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.batches_completed >= self.batches_expected
    }
}

// ============================================================================
// SECTION: Progress Accounting
// ============================================================================

/// Snapshot of job progress after one envelope is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
    /// Batches aggregated, including the envelope just applied.
    pub batches_completed: u64,
    /// Fixed batch count for the job.
    pub batches_expected: u64,
    /// Running match total, including the envelope just applied.
    pub found_count: u64,
    /// True when this envelope crossed the completion threshold.
    pub newly_completed: bool,
}

/// Outcome of applying one result envelope to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Counters advanced; carries the post-advance snapshot.
    Advanced(JobProgress),
    /// The `(job, batch_index)` pair was already aggregated; no-op.
    DuplicateBatch,
    /// No job row exists for the envelope's job identifier.
    UnknownJob,
}

/// Returns the number of work units for `total_hashes` targets.
///
/// Ceiling division; zero targets yield zero units. A zero partition size is
/// treated as one.
#[must_use]
pub const fn batches_for(total_hashes: u64, partition_size: u64) -> u64 {
    let size = if partition_size == 0 { 1 } else { partition_size };
    total_hashes.div_ceil(size)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::batches_for;

    #[test]
    fn batches_for_empty_input_is_zero() {
        assert_eq!(batches_for(0, 1000), 0);
    }

    #[test]
    fn batches_for_exact_multiple_has_no_remainder_unit() {
        assert_eq!(batches_for(1000, 1000), 1);
    }

    #[test]
    fn batches_for_one_past_boundary_adds_a_unit() {
        assert_eq!(batches_for(1001, 1000), 2);
    }
}
