// crates/preimage-coordinator/tests/events_tests.rs
// ============================================================================
// Module: Event Hub Tests
// Description: Subscriber registration, delivery, eviction, and completion.
// Purpose: Validate the one-subscriber-per-job fan-out contract.
// Dependencies: preimage-coordinator, preimage-core, tokio
// ============================================================================

//! ## Overview
//! Exercises [`preimage_coordinator::EventHub`]: best-effort publication,
//! replacement on re-subscription, eviction of backed-up subscribers, and
//! clean close on completion.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use preimage_coordinator::EventHub;
use preimage_coordinator::SUBSCRIBER_BUFFER;
use preimage_core::JobEvent;
use preimage_core::JobId;
use tokio::sync::mpsc::error::TryRecvError;

/// Builds a progress event for hub tests.
fn progress(batches_completed: u64) -> JobEvent {
    JobEvent::Progress {
        batches_completed,
        batches_expected: 10,
        found_count: 0,
    }
}

/// Tests publishing without a subscriber drops the event silently.
#[test]
fn publish_without_subscriber_is_dropped() {
    let hub = EventHub::new();
    hub.publish(&JobId::generate(), progress(1));
    assert_eq!(hub.subscriber_count(), 0);
}

/// Tests a subscriber receives published events in order.
#[test]
fn subscriber_receives_events_in_order() {
    let hub = EventHub::new();
    let job_id = JobId::generate();
    let mut receiver = hub.subscribe(job_id);
    hub.publish(&job_id, progress(1));
    hub.publish(&job_id, progress(2));
    assert!(matches!(receiver.try_recv().expect("event"), JobEvent::Progress {
        batches_completed: 1,
        ..
    }));
    assert!(matches!(receiver.try_recv().expect("event"), JobEvent::Progress {
        batches_completed: 2,
        ..
    }));
    assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));
}

/// Tests events are scoped to their job.
#[test]
fn events_are_scoped_per_job() {
    let hub = EventHub::new();
    let first = JobId::generate();
    let second = JobId::generate();
    let mut first_rx = hub.subscribe(first);
    let mut second_rx = hub.subscribe(second);
    hub.publish(&first, progress(1));
    assert!(first_rx.try_recv().is_ok());
    assert!(matches!(second_rx.try_recv(), Err(TryRecvError::Empty)));
}

/// Tests re-subscription replaces and cleanly closes the prior stream.
#[test]
fn resubscribe_evicts_prior_subscriber() {
    let hub = EventHub::new();
    let job_id = JobId::generate();
    let mut first = hub.subscribe(job_id);
    let mut second = hub.subscribe(job_id);
    assert_eq!(hub.subscriber_count(), 1);

    hub.publish(&job_id, progress(1));
    assert!(matches!(first.try_recv(), Err(TryRecvError::Disconnected)));
    assert!(second.try_recv().is_ok());
}

/// Tests completion removes the subscriber and ends its stream.
#[test]
fn complete_closes_stream_cleanly() {
    let hub = EventHub::new();
    let job_id = JobId::generate();
    let mut receiver = hub.subscribe(job_id);
    hub.publish(&job_id, progress(1));
    hub.complete(&job_id);
    assert_eq!(hub.subscriber_count(), 0);

    assert!(receiver.try_recv().is_ok());
    assert!(matches!(receiver.try_recv(), Err(TryRecvError::Disconnected)));
}

/// Tests a backed-up subscriber is evicted instead of blocking publishers.
#[test]
fn backed_up_subscriber_is_evicted() {
    let hub = EventHub::new();
    let job_id = JobId::generate();
    let _receiver = hub.subscribe(job_id);
    for index in 0..=SUBSCRIBER_BUFFER as u64 {
        hub.publish(&job_id, progress(index));
    }
    assert_eq!(hub.subscriber_count(), 0);
}
