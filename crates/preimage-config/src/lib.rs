// crates/preimage-config/src/lib.rs
// ============================================================================
// Module: Preimage Config Library
// Description: Shared TOML configuration for coordinator and worker.
// Purpose: Load and validate service configuration fail-closed.
// Dependencies: preimage-broker, preimage-store-postgres, serde, toml
// ============================================================================

//! ## Overview
//! One [`ServiceConfig`] covers both binaries: storage and bus connections,
//! consumer pacing, the coordinator's HTTP bind and partition size, and pool
//! concurrencies. Loading is strict and validation fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::CoordinatorSettings;
pub use config::MAX_PARTITION_SIZE;
pub use config::MAX_RESULTS_CONCURRENCY;
pub use config::MAX_WORKER_CONCURRENCY;
pub use config::QueueSettings;
pub use config::ServiceConfig;
pub use config::WorkerSettings;
