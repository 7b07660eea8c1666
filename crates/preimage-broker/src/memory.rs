// crates/preimage-broker/src/memory.rs
// ============================================================================
// Module: In-Memory Queue
// Description: Process-local queue with the durable-bus claim semantics.
// Purpose: Back hermetic pipeline tests and single-process deployments.
// Dependencies: preimage-broker queue, std
// ============================================================================

//! ## Overview
//! [`MemoryQueue`] reproduces the bus contract in memory: FIFO claims, claim
//! leases with expiry reclamation, ack removal, and nack redelivery at the
//! head of the queue. Replayed messages keep their identifiers so tests can
//! assert redelivery.
//! Invariants:
//! - A message is either ready or held by exactly one live claim.
//! - Lease expiry returns a message to the head of its queue.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use crate::queue::Delivery;
use crate::queue::MessageQueue;
use crate::queue::QueueError;
use crate::queue::QueueName;

// ============================================================================
// SECTION: Queue State
// ============================================================================

/// One enqueued message.
#[derive(Debug, Clone)]
struct StoredMessage {
    /// Queue-assigned identifier.
    message_id: i64,
    /// Claim generations handed out so far.
    attempts: i64,
    /// Raw wire frame.
    payload: String,
}

/// One live claim.
#[derive(Debug)]
struct Claim {
    /// Queue the message belongs to.
    queue: QueueName,
    /// Claimed message.
    message: StoredMessage,
    /// Instant after which the claim lapses.
    deadline: Instant,
}

/// Mutable queue tables held under one lock.
#[derive(Debug, Default)]
struct QueueTables {
    /// Next message identifier.
    next_id: i64,
    /// Ready messages per queue, oldest first.
    ready: HashMap<QueueName, VecDeque<StoredMessage>>,
    /// Live claims keyed by message identifier.
    claims: HashMap<i64, Claim>,
}

impl QueueTables {
    /// Returns lapsed claims to the head of their queues.
    fn reclaim_expired(&mut self, now: Instant) {
        let expired: Vec<i64> = self
            .claims
            .iter()
            .filter(|(_, claim)| claim.deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(claim) = self.claims.remove(&id) {
                self.ready.entry(claim.queue).or_default().push_front(claim.message);
            }
        }
    }
}

// ============================================================================
// SECTION: In-Memory Queue
// ============================================================================

/// Process-local [`MessageQueue`] with lease semantics.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    /// Queue tables protected by a mutex.
    tables: Mutex<QueueTables>,
}

impl MemoryQueue {
    /// Creates an empty in-memory queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of ready messages in a queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] when the queue lock is poisoned.
    pub fn ready_len(&self, queue: QueueName) -> Result<usize, QueueError> {
        let tables =
            self.tables.lock().map_err(|_| QueueError::Io("queue mutex poisoned".to_string()))?;
        Ok(tables.ready.get(&queue).map_or(0, VecDeque::len))
    }
}

impl MessageQueue for MemoryQueue {
    fn publish(&self, queue: QueueName, payload: &str) -> Result<(), QueueError> {
        let mut tables =
            self.tables.lock().map_err(|_| QueueError::Io("queue mutex poisoned".to_string()))?;
        tables.next_id += 1;
        let message = StoredMessage {
            message_id: tables.next_id,
            attempts: 0,
            payload: payload.to_string(),
        };
        tables.ready.entry(queue).or_default().push_back(message);
        Ok(())
    }

    fn claim(&self, queue: QueueName, lease: Duration) -> Result<Option<Delivery>, QueueError> {
        let mut tables =
            self.tables.lock().map_err(|_| QueueError::Io("queue mutex poisoned".to_string()))?;
        let now = Instant::now();
        tables.reclaim_expired(now);
        let Some(mut message) = tables.ready.entry(queue).or_default().pop_front() else {
            return Ok(None);
        };
        message.attempts += 1;
        let delivery = Delivery {
            message_id: message.message_id,
            claim_token: message.attempts,
            queue,
            payload: message.payload.clone(),
        };
        tables.claims.insert(message.message_id, Claim {
            queue,
            message,
            deadline: now + lease,
        });
        Ok(Some(delivery))
    }

    fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut tables =
            self.tables.lock().map_err(|_| QueueError::Io("queue mutex poisoned".to_string()))?;
        let held = matches!(
            tables.claims.get(&delivery.message_id),
            Some(claim) if claim.message.attempts == delivery.claim_token
        );
        if !held {
            return Err(QueueError::UnknownDelivery(delivery.message_id));
        }
        tables.claims.remove(&delivery.message_id);
        Ok(())
    }

    fn nack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut tables =
            self.tables.lock().map_err(|_| QueueError::Io("queue mutex poisoned".to_string()))?;
        let held = matches!(
            tables.claims.get(&delivery.message_id),
            Some(claim) if claim.message.attempts == delivery.claim_token
        );
        if !held {
            return Err(QueueError::UnknownDelivery(delivery.message_id));
        }
        let claim = tables
            .claims
            .remove(&delivery.message_id)
            .ok_or(QueueError::UnknownDelivery(delivery.message_id))?;
        tables.ready.entry(claim.queue).or_default().push_front(claim.message);
        Ok(())
    }
}
