// crates/preimage-broker/src/consumer.rs
// ============================================================================
// Module: Consumer Pool
// Description: Blocking consumer threads draining one queue.
// Purpose: Run claim/handle/ack loops with nack-on-failure replay.
// Dependencies: preimage-broker queue and wire, tracing
// ============================================================================

//! ## Overview
//! A [`ConsumerPool`] runs a fixed number of threads, each claiming one
//! message at a time, decoding it, and invoking the shared handler. A handler
//! error (or a decode error) nacks the claim so the bus redelivers it; the
//! handler must therefore be idempotent. Claims are leased slightly beyond
//! the poll interval so a stalled consumer's messages return to the queue.
//! Invariants:
//! - A consumer thread processes one message to completion before the next
//!   claim.
//! - Every claimed message is either acked or released for redelivery.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::info;
use tracing::warn;

use crate::queue::MessageQueue;
use crate::queue::QueueName;
use crate::queue::SharedQueue;
use crate::wire::QueueMessage;
use crate::wire::decode;

// ============================================================================
// SECTION: Handler Contract
// ============================================================================

/// Error returned by message handlers; the message is nacked and replayed.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Shared handler invoked once per claimed message.
pub type MessageHandler = dyn Fn(&QueueMessage) -> Result<(), HandlerError> + Send + Sync;

// ============================================================================
// SECTION: Pool Config
// ============================================================================

/// Consumer pool configuration.
#[derive(Debug, Clone)]
pub struct ConsumerPoolConfig {
    /// Queue drained by this pool.
    pub queue: QueueName,
    /// Number of consumer threads.
    pub concurrency: usize,
    /// Sleep between claims when the queue is empty.
    pub poll_interval: Duration,
    /// Visibility lease stamped on each claim.
    pub lease: Duration,
}

// ============================================================================
// SECTION: Consumer Pool
// ============================================================================

/// Pool of blocking consumer threads for one queue.
pub struct ConsumerPool {
    /// Cooperative shutdown flag shared with the threads.
    shutdown: Arc<AtomicBool>,
    /// Join handles for the consumer threads.
    handles: Vec<JoinHandle<()>>,
}

impl ConsumerPool {
    /// Spawns the pool's consumer threads.
    #[must_use]
    pub fn spawn(
        queue: SharedQueue,
        config: ConsumerPoolConfig,
        handler: Arc<MessageHandler>,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let concurrency = config.concurrency.max(1);
        let mut handles = Vec::with_capacity(concurrency);
        for index in 0..concurrency {
            let queue = queue.clone();
            let config = config.clone();
            let handler = Arc::clone(&handler);
            let shutdown = Arc::clone(&shutdown);
            handles.push(thread::spawn(move || {
                info!(queue = config.queue.as_str(), consumer = index, "consumer started");
                consume_loop(&queue, &config, handler.as_ref(), &shutdown);
                info!(queue = config.queue.as_str(), consumer = index, "consumer stopped");
            }));
        }
        Self {
            shutdown,
            handles,
        }
    }

    /// Signals the threads to stop and waits for them to exit.
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for handle in self.handles {
            let _ = handle.join();
        }
    }

    /// Waits for the threads without signaling shutdown.
    ///
    /// Blocks until the process is torn down externally; this is the run
    /// mode of a worker binary.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

/// Claim/handle/ack loop for one consumer thread.
fn consume_loop(
    queue: &SharedQueue,
    config: &ConsumerPoolConfig,
    handler: &MessageHandler,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let delivery = match queue.claim(config.queue, config.lease) {
            Ok(Some(delivery)) => delivery,
            Ok(None) => {
                thread::sleep(config.poll_interval);
                continue;
            }
            Err(err) => {
                warn!(queue = config.queue.as_str(), error = %err, "claim failed");
                thread::sleep(config.poll_interval);
                continue;
            }
        };
        let handled = decode(&delivery.payload)
            .map_err(HandlerError::from)
            .and_then(|message| handler(&message));
        match handled {
            Ok(()) => {
                if let Err(err) = queue.ack(&delivery) {
                    warn!(message_id = delivery.message_id, error = %err, "ack failed");
                }
            }
            Err(err) => {
                warn!(
                    message_id = delivery.message_id,
                    error = %err,
                    "handler failed; releasing message for redelivery"
                );
                if let Err(err) = queue.nack(&delivery) {
                    warn!(message_id = delivery.message_id, error = %err, "nack failed");
                }
            }
        }
    }
}
