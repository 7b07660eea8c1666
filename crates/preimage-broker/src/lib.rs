// crates/preimage-broker/src/lib.rs
// ============================================================================
// Module: Preimage Broker Library
// Description: Durable queue contract, wire codec, and bus adapters.
// Purpose: Carry work units to workers and result envelopes back.
// Dependencies: preimage-core, postgres, serde_json
// ============================================================================

//! ## Overview
//! The broker crate defines the at-least-once bus the pipeline rides on: a
//! versioned wire codec, the [`MessageQueue`] claim/ack/nack contract, a
//! durable Postgres-backed queue, an in-memory queue with identical
//! semantics, and a blocking [`ConsumerPool`] that drains one queue through
//! a shared handler.
//! Invariants:
//! - Delivery is at-least-once; handlers must be idempotent under replay.
//! - Frames decode fail-closed on version or kind mismatch.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod consumer;
pub mod memory;
pub mod postgres;
pub mod queue;
pub mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use consumer::ConsumerPool;
pub use consumer::ConsumerPoolConfig;
pub use consumer::HandlerError;
pub use consumer::MessageHandler;
pub use memory::MemoryQueue;
pub use postgres::PostgresQueue;
pub use postgres::PostgresQueueConfig;
pub use queue::Delivery;
pub use queue::MessageQueue;
pub use queue::QueueError;
pub use queue::QueueName;
pub use queue::SharedQueue;
pub use wire::QueueMessage;
pub use wire::WIRE_SCHEMA_VERSION;
pub use wire::WireError;
pub use wire::decode;
pub use wire::decode_result_envelope;
pub use wire::decode_work_unit;
pub use wire::encode;
