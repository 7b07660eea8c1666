// crates/preimage-store-postgres/src/lib.rs
// ============================================================================
// Module: Preimage Postgres Store Library
// Description: Durable Postgres adapters for the store interfaces.
// Purpose: Persist jobs, targets, results, and serve the mapping table.
// Dependencies: preimage-core, postgres, r2d2
// ============================================================================

//! ## Overview
//! Postgres implementations of [`preimage_core::JobStore`] and
//! [`preimage_core::MappingStore`], sharing one pooled connection set, plus
//! schema bootstrap for local environments.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::PostgresStore;
pub use store::PostgresStoreConfig;
pub use store::PostgresStoreError;
pub use store::shared_postgres_stores;
