// crates/preimage-coordinator/src/artifact.rs
// ============================================================================
// Module: Result Artifact
// Description: CSV rendering of a job's targets and discovered preimages.
// Purpose: Produce the downloadable per-job result file.
// Dependencies: preimage-core
// ============================================================================

//! ## Overview
//! The artifact is regenerated on every request from the target set
//! left-joined with discovered results: one `hash,phone` header line, then
//! one line per target in lexicographic fingerprint order, with `NOT FOUND`
//! standing in for unresolved fingerprints. Requests before completion see a
//! partial snapshot; targets are fixed and results only grow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use preimage_core::JobId;
use preimage_core::ReportRow;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Placeholder for targets absent from the mapping.
pub const NOT_FOUND: &str = "NOT FOUND";

/// Renders report rows as the downloadable CSV body.
#[must_use]
pub fn render_csv(rows: &[ReportRow]) -> String {
    let mut csv = String::from("hash,phone\n");
    for row in rows {
        csv.push_str(&row.fingerprint.to_hex());
        csv.push(',');
        csv.push_str(row.preimage.as_deref().unwrap_or(NOT_FOUND));
        csv.push('\n');
    }
    csv
}

/// Returns the attachment filename for a job's artifact.
#[must_use]
pub fn artifact_filename(job_id: &JobId) -> String {
    format!("{job_id}-results.csv")
}
