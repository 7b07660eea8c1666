// crates/preimage-core/src/targets.rs
// ============================================================================
// Module: Target Admission and Partitioning
// Description: Line admission rules and work-unit partitioning.
// Purpose: Turn an uploaded byte stream into admitted fingerprints and units.
// Dependencies: preimage-core identifiers
// ============================================================================

//! ## Overview
//! Uploads are line-delimited text. A line is admitted when, after trimming
//! surrounding whitespace, it is exactly 32 hex characters; every other line
//! is silently discarded. Admitted fingerprints keep their input order and
//! duplicates, and are partitioned into dense, indexed units of at most the
//! configured partition size.
//! Invariants:
//! - `admit_targets` never rejects an upload; malformed input yields an
//!   empty target list.
//! - Unit indices are dense in `[0, ceil(n / partition_size))`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::envelope::WorkUnit;
use crate::identifiers::Fingerprint;
use crate::identifiers::JobId;

// ============================================================================
// SECTION: Admission
// ============================================================================

/// Default partition size when none is configured.
pub const DEFAULT_PARTITION_SIZE: usize = 1000;

/// Admits fingerprints from line-delimited upload text.
///
/// Lines are trimmed; only exactly-32-hex-character lines survive. Order and
/// duplicates are preserved.
#[must_use]
pub fn admit_targets(input: &str) -> Vec<Fingerprint> {
    input.lines().filter_map(|line| Fingerprint::from_hex(line.trim()).ok()).collect()
}

// ============================================================================
// SECTION: Partitioning
// ============================================================================

/// Splits admitted fingerprints into dense, indexed work units.
///
/// The final unit carries the remainder and may be shorter than
/// `partition_size`. Zero fingerprints yield zero units.
#[must_use]
pub fn partition_units(
    job_id: JobId,
    fingerprints: &[Fingerprint],
    partition_size: usize,
) -> Vec<WorkUnit> {
    fingerprints
        .chunks(partition_size.max(1))
        .enumerate()
        .map(|(index, chunk)| WorkUnit {
            job_id,
            batch_index: index as u64,
            fingerprints: chunk.to_vec(),
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
