// crates/preimage-core/src/lib.rs
// ============================================================================
// Module: Preimage Core Library
// Description: Domain types, partitioning logic, and store interfaces.
// Purpose: Shared vocabulary for the coordinator, workers, and adapters.
// Dependencies: chrono, serde, thiserror, uuid
// ============================================================================

//! ## Overview
//! Core vocabulary of the distributed reverse-lookup pipeline: typed
//! identifiers, job state, in-flight work units and result envelopes,
//! subscriber events, target admission and partitioning, and the store
//! interfaces the adapters implement.
//! Invariants:
//! - Fingerprints are canonical lowercase hex in every persisted and
//!   rendered form.
//! - Job state advances monotonically and completion is terminal.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod envelope;
pub mod events;
pub mod identifiers;
pub mod job;
pub mod store;
pub mod targets;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use envelope::ResultEnvelope;
pub use envelope::ResultMatch;
pub use envelope::WorkUnit;
pub use events::JobEvent;
pub use identifiers::FINGERPRINT_BYTES;
pub use identifiers::FINGERPRINT_HEX_CHARS;
pub use identifiers::Fingerprint;
pub use identifiers::FingerprintError;
pub use identifiers::JobId;
pub use job::JobProgress;
pub use job::JobRecord;
pub use job::JobStatus;
pub use job::ProgressOutcome;
pub use job::batches_for;
pub use store::InMemoryJobStore;
pub use store::InMemoryMappingStore;
pub use store::JobStore;
pub use store::MappingStore;
pub use store::ReportRow;
pub use store::SharedJobStore;
pub use store::SharedMappingStore;
pub use store::StoreError;
pub use targets::DEFAULT_PARTITION_SIZE;
pub use targets::admit_targets;
pub use targets::partition_units;
