// crates/preimage-broker/src/queue.rs
// ============================================================================
// Module: Message Queue Contract
// Description: Durable queue trait with claim leases and ack/nack semantics.
// Purpose: Define the at-least-once bus the pipeline is built against.
// Dependencies: preimage-broker wire, thiserror
// ============================================================================

//! ## Overview
//! The bus exposes two logical queues: `work` (coordinator to workers,
//! load-balanced) and `results` (workers to coordinator, fan-in). A claimed
//! message is invisible to other consumers for a bounded lease; it is
//! removed on ack, and made immediately available again on nack or lease
//! expiry. Delivery is therefore at-least-once and consumers must be
//! idempotent under replay.
//! Invariants:
//! - A message is claimed by at most one consumer at a time.
//! - Ack and nack are valid only for a consumer's own live claim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::wire::QueueMessage;
use crate::wire::WireError;
use crate::wire::encode;

// ============================================================================
// SECTION: Queue Errors
// ============================================================================

/// Errors returned by queue implementations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Underlying transport or storage failed.
    #[error("queue io error: {0}")]
    Io(String),
    /// Message payload failed to encode or decode.
    #[error("queue codec error: {0}")]
    Codec(#[from] WireError),
    /// Ack or nack referenced a delivery this queue does not hold.
    #[error("unknown delivery {0}")]
    UnknownDelivery(i64),
}

// ============================================================================
// SECTION: Queue Names
// ============================================================================

/// Logical queue identifiers, doubling as routing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueName {
    /// Coordinator-to-worker dispatch queue.
    Work,
    /// Worker-to-coordinator result queue.
    Results,
}

impl QueueName {
    /// Returns the routing key for this queue.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Results => "results",
        }
    }
}

// ============================================================================
// SECTION: Delivery Handle
// ============================================================================

/// One claimed message, valid until acked, nacked, or lease expiry.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Queue-assigned message identifier.
    pub message_id: i64,
    /// Claim generation fencing this delivery.
    ///
    /// Ack and nack match on this token, so a consumer whose lease lapsed
    /// cannot affect a later redelivery of the same message.
    pub claim_token: i64,
    /// Queue the message was claimed from.
    pub queue: QueueName,
    /// Raw wire frame.
    pub payload: String,
}

// ============================================================================
// SECTION: Queue Trait
// ============================================================================

/// Durable message bus with claim leases.
pub trait MessageQueue: Send + Sync {
    /// Appends a raw frame to a queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the append fails; the frame is not
    /// enqueued.
    fn publish(&self, queue: QueueName, payload: &str) -> Result<(), QueueError>;

    /// Claims the oldest available message, leasing it for `lease`.
    ///
    /// Returns `None` when the queue has no available message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when the claim fails.
    fn claim(&self, queue: QueueName, lease: Duration) -> Result<Option<Delivery>, QueueError>;

    /// Removes a claimed message permanently.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownDelivery`] when the claim is no longer
    /// held.
    fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Releases a claimed message for immediate redelivery.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::UnknownDelivery`] when the claim is no longer
    /// held.
    fn nack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Encodes and publishes a typed queue message.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when encoding or the append fails.
    fn publish_message(&self, queue: QueueName, message: &QueueMessage) -> Result<(), QueueError> {
        self.publish(queue, &encode(message)?)
    }
}

// ============================================================================
// SECTION: Shared Queue Wrapper
// ============================================================================

/// Shared queue handle backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedQueue {
    /// Inner queue implementation.
    inner: Arc<dyn MessageQueue>,
}

impl SharedQueue {
    /// Wraps a queue in a shared, clonable handle.
    #[must_use]
    pub fn from_queue(queue: impl MessageQueue + 'static) -> Self {
        Self {
            inner: Arc::new(queue),
        }
    }

    /// Wraps an existing shared queue.
    #[must_use]
    pub const fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self {
            inner: queue,
        }
    }
}

impl MessageQueue for SharedQueue {
    fn publish(&self, queue: QueueName, payload: &str) -> Result<(), QueueError> {
        self.inner.publish(queue, payload)
    }

    fn claim(&self, queue: QueueName, lease: Duration) -> Result<Option<Delivery>, QueueError> {
        self.inner.claim(queue, lease)
    }

    fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.inner.ack(delivery)
    }

    fn nack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.inner.nack(delivery)
    }
}
