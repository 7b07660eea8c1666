// crates/preimage-core/src/envelope.rs
// ============================================================================
// Module: Work Units and Result Envelopes
// Description: In-flight records exchanged between coordinator and workers.
// Purpose: Model the atomic dispatch unit and its per-unit result record.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`WorkUnit`] is an indexed slice of at most the configured partition
//! size of a job's admitted fingerprints. A [`ResultEnvelope`] is the
//! worker-produced record for one unit, listing every mapping hit found in
//! it. Both are keyed by `(job_id, batch_index)`.
//! Invariants:
//! - `batch_index` is dense in `[0, batches_expected)` across a job's units.
//! - An envelope's matches are a subset of its unit's fingerprints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::Fingerprint;
use crate::identifiers::JobId;

// ============================================================================
// SECTION: Work Unit
// ============================================================================

/// One dispatchable slice of a job's fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Owning job.
    pub job_id: JobId,
    /// Zero-based index of this unit within the job.
    pub batch_index: u64,
    /// Ordered fingerprints in this unit; never longer than the partition size.
    pub fingerprints: Vec<Fingerprint>,
}

// ============================================================================
// SECTION: Result Envelope
// ============================================================================

/// A single resolved fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMatch {
    /// Fingerprint that was resolved.
    pub fingerprint: Fingerprint,
    /// Recovered preimage.
    pub preimage: String,
}

/// Worker-produced record of the matches found in one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Owning job.
    pub job_id: JobId,
    /// Index of the unit this envelope answers.
    pub batch_index: u64,
    /// Matches discovered in the unit; may be empty.
    pub matches: Vec<ResultMatch>,
}
