// crates/preimage-coordinator/src/lib.rs
// ============================================================================
// Module: Preimage Coordinator Library
// Description: Job ingestion, aggregation, event fan-out, and HTTP surface.
// Purpose: Own the job lifecycle from upload to downloadable artifact.
// Dependencies: preimage-broker, preimage-core, axum, tokio
// ============================================================================

//! ## Overview
//! The coordinator accepts uploads, partitions them into work units on the
//! bus, aggregates worker result envelopes into monotonically advancing job
//! state, fans lifecycle events out to per-job subscribers, and serves
//! status queries and the CSV artifact.
//! Invariants:
//! - Job state is advanced only by the aggregator, exactly once per batch.
//! - Events for one job are emitted in the aggregator's local order.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregate;
pub mod artifact;
pub mod events;
pub mod http;
pub mod ingest;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::ResultAggregator;
pub use aggregate::results_handler;
pub use artifact::NOT_FOUND;
pub use artifact::artifact_filename;
pub use artifact::render_csv;
pub use events::EventHub;
pub use events::SUBSCRIBER_BUFFER;
pub use http::AppState;
pub use http::MAX_UPLOAD_BYTES;
pub use http::ServeError;
pub use http::router;
pub use http::serve;
pub use ingest::IngestError;
pub use ingest::JobIntake;
