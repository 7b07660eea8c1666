// crates/preimage-coordinator/tests/pipeline_tests.rs
// ============================================================================
// Module: Pipeline Tests
// Description: End-to-end job flow over in-memory stores and bus.
// Purpose: Validate ingestion, lookup, aggregation, and artifact output.
// Dependencies: preimage-broker, preimage-coordinator, preimage-core,
//               preimage-worker
// ============================================================================

//! ## Overview
//! Drives the whole pipeline hermetically: uploads enter through
//! [`preimage_coordinator::JobIntake`], work units are claimed and processed
//! by the worker's [`preimage_worker::UnitProcessor`], and result envelopes
//! are applied by [`preimage_coordinator::ResultAggregator`], all over the
//! in-memory queue and stores.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use preimage_broker::MemoryQueue;
use preimage_broker::MessageQueue;
use preimage_broker::QueueName;
use preimage_broker::SharedQueue;
use preimage_broker::decode_result_envelope;
use preimage_broker::decode_work_unit;
use preimage_core::Fingerprint;
use preimage_core::InMemoryJobStore;
use preimage_core::InMemoryMappingStore;
use preimage_core::JobEvent;
use preimage_core::JobStatus;
use preimage_core::JobStore;
use preimage_core::SharedJobStore;
use preimage_core::SharedMappingStore;
use preimage_core::WorkUnit;
use preimage_coordinator::EventHub;
use preimage_coordinator::JobIntake;
use preimage_coordinator::ResultAggregator;
use preimage_coordinator::render_csv;
use preimage_worker::UnitProcessor;

/// Lease used for test claims.
const LEASE: Duration = Duration::from_secs(60);

/// One hermetic deployment: coordinator services plus one worker.
struct Pipeline {
    /// Shared job store.
    store: SharedJobStore,
    /// Mapping loaded per test.
    mapping: InMemoryMappingStore,
    /// Raw queue handle for claims and inspection.
    queue: Arc<MemoryQueue>,
    /// Event fan-out hub.
    hub: Arc<EventHub>,
    /// Ingestion service under test.
    intake: JobIntake,
    /// Worker-side processor under test.
    processor: UnitProcessor,
    /// Coordinator-side aggregator under test.
    aggregator: ResultAggregator,
}

impl Pipeline {
    /// Builds the deployment with the given partition size.
    fn new(partition_size: usize) -> Self {
        let store = SharedJobStore::from_store(InMemoryJobStore::new());
        let mapping = InMemoryMappingStore::new();
        let queue = Arc::new(MemoryQueue::new());
        let shared_queue = SharedQueue::new(queue.clone());
        let hub = Arc::new(EventHub::new());
        let intake =
            JobIntake::new(store.clone(), shared_queue.clone(), Arc::clone(&hub), partition_size);
        let processor = UnitProcessor::new(
            store.clone(),
            SharedMappingStore::from_store(mapping.clone()),
            shared_queue.clone(),
        );
        let aggregator = ResultAggregator::new(store.clone(), Arc::clone(&hub));
        Self {
            store,
            mapping,
            queue,
            hub,
            intake,
            processor,
            aggregator,
        }
    }

    /// Claims every work unit, processes it, and acks.
    ///
    /// Returns the processed units in claim order.
    fn drain_work(&self) -> Vec<WorkUnit> {
        let mut units = Vec::new();
        while let Some(delivery) = self.queue.claim(QueueName::Work, LEASE).expect("claim") {
            let unit = decode_work_unit(&delivery.payload).expect("decode unit");
            self.processor.process(&unit).expect("process unit");
            self.queue.ack(&delivery).expect("ack");
            units.push(unit);
        }
        units
    }

    /// Claims every result envelope, aggregates it, and acks.
    fn drain_results(&self) -> usize {
        let mut applied = 0;
        while let Some(delivery) = self.queue.claim(QueueName::Results, LEASE).expect("claim") {
            let envelope = decode_result_envelope(&delivery.payload).expect("decode envelope");
            self.aggregator.apply(&envelope).expect("aggregate");
            self.queue.ack(&delivery).expect("ack");
            applied += 1;
        }
        applied
    }
}

/// Tests a small job completes with matched and unmatched targets.
#[test]
fn small_job_completes_with_partial_matches() {
    let pipeline = Pipeline::new(1000);
    pipeline
        .mapping
        .insert(
            Fingerprint::from_hex("a1b2c3d4e5f6789012345678901234ab").expect("fingerprint"),
            "050-1234567",
        )
        .expect("load mapping");
    pipeline
        .mapping
        .insert(
            Fingerprint::from_hex("fedcba0987654321fedcba0987654321").expect("fingerprint"),
            "050-7654321",
        )
        .expect("load mapping");

    let upload = "a1b2c3d4e5f6789012345678901234ab\n1234567890abcdef1234567890abcdef\nfedcba0987654321fedcba0987654321\n";
    let job_id = pipeline.intake.create_job(upload).expect("create");

    assert_eq!(pipeline.drain_work().len(), 1);
    assert_eq!(pipeline.drain_results(), 1);

    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_hashes, 3);
    assert_eq!(job.batches_expected, 1);
    assert_eq!(job.batches_completed, 1);
    assert_eq!(job.found_count, 2);

    let csv = render_csv(&pipeline.store.report_rows(&job_id).expect("rows"));
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "hash,phone");
    assert_eq!(lines[1], "1234567890abcdef1234567890abcdef,NOT FOUND");
    assert_eq!(lines[2], "a1b2c3d4e5f6789012345678901234ab,050-1234567");
    assert_eq!(lines[3], "fedcba0987654321fedcba0987654321,050-7654321");
}

/// Tests a multi-unit job with no matches completes cleanly.
#[test]
fn multi_unit_job_without_matches_completes() {
    let pipeline = Pipeline::new(1000);
    let upload: String =
        (0..2500).map(|index| format!("{index:032x}\n")).collect();
    let job_id = pipeline.intake.create_job(&upload).expect("create");

    let units = pipeline.drain_work();
    assert_eq!(units.len(), 3);
    assert_eq!(units[2].fingerprints.len(), 500);
    assert_eq!(pipeline.drain_results(), 3);

    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.batches_expected, 3);
    assert_eq!(job.batches_completed, 3);
    assert_eq!(job.found_count, 0);
    assert_eq!(job.status, JobStatus::Completed);
}

/// Tests a unit of exactly the partition size yields one batch.
#[test]
fn exact_partition_size_yields_one_unit() {
    let pipeline = Pipeline::new(1000);
    let upload: String = (0..1000).map(|index| format!("{index:032x}\n")).collect();
    let job_id = pipeline.intake.create_job(&upload).expect("create");
    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.batches_expected, 1);
    assert_eq!(pipeline.drain_work().len(), 1);
}

/// Tests one fingerprint past the boundary adds a single-entry unit.
#[test]
fn partition_boundary_plus_one_yields_short_last_unit() {
    let pipeline = Pipeline::new(1000);
    let upload: String = (0..1001).map(|index| format!("{index:032x}\n")).collect();
    let job_id = pipeline.intake.create_job(&upload).expect("create");
    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.batches_expected, 2);
    let units = pipeline.drain_work();
    assert_eq!(units[1].fingerprints.len(), 1);
}

/// Tests malformed lines are dropped and valid ones admitted.
#[test]
fn mixed_upload_admits_only_valid_lines() {
    let pipeline = Pipeline::new(1000);
    let upload = "a1b2c3d4e5f6789012345678901234ab\nshort\n1234567890abcdef1234567890abcdef\n\nthis-line-is-way-too-long-to-be-a-fingerprint\nfedcba0987654321fedcba0987654321";
    let job_id = pipeline.intake.create_job(upload).expect("create");
    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.total_hashes, 3);
    assert_eq!(pipeline.store.report_rows(&job_id).expect("rows").len(), 3);
}

/// Tests an upload that admits nothing is terminal at creation.
#[test]
fn empty_job_is_completed_at_creation() {
    let pipeline = Pipeline::new(1000);
    let job_id = pipeline.intake.create_job("nothing valid here\n\n").expect("create");
    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.total_hashes, 0);
    assert_eq!(job.batches_expected, 0);
    assert_eq!(pipeline.queue.ready_len(QueueName::Work).expect("len"), 0);
    let csv = render_csv(&pipeline.store.report_rows(&job_id).expect("rows"));
    assert_eq!(csv, "hash,phone\n");
}

/// Tests the same upload twice yields two independent jobs.
#[test]
fn repeated_upload_yields_disjoint_jobs() {
    let pipeline = Pipeline::new(1000);
    let upload = "a1b2c3d4e5f6789012345678901234ab\n";
    let first = pipeline.intake.create_job(upload).expect("create");
    let second = pipeline.intake.create_job(upload).expect("create");
    assert_ne!(first, second);
    pipeline.drain_work();
    pipeline.drain_results();
    assert_eq!(pipeline.store.load_job(&first).expect("load").expect("job").batches_completed, 1);
    assert_eq!(pipeline.store.load_job(&second).expect("load").expect("job").batches_completed, 1);
}

/// Tests an envelope for a job this coordinator never created is dropped.
#[test]
fn envelope_for_unknown_job_is_dropped_silently() {
    let pipeline = Pipeline::new(1000);
    let ghost = preimage_core::JobId::generate();
    let mut receiver = pipeline.hub.subscribe(ghost);
    let envelope = preimage_core::ResultEnvelope {
        job_id: ghost,
        batch_index: 0,
        matches: Vec::new(),
    };
    pipeline.aggregator.apply(&envelope).expect("apply");
    assert!(receiver.try_recv().is_err());
}

/// Tests replaying a unit leaves results set-equal and counters advanced once.
#[test]
fn replayed_unit_is_idempotent_end_to_end() {
    let pipeline = Pipeline::new(1000);
    let hit = Fingerprint::from_hex("a1b2c3d4e5f6789012345678901234ab").expect("fingerprint");
    pipeline.mapping.insert(hit, "050-1234567").expect("load mapping");
    let job_id =
        pipeline.intake.create_job("a1b2c3d4e5f6789012345678901234ab\n").expect("create");

    let delivery = pipeline.queue.claim(QueueName::Work, LEASE).expect("claim").expect("unit");
    let unit = decode_work_unit(&delivery.payload).expect("decode");
    pipeline.processor.process(&unit).expect("first pass");
    pipeline.processor.process(&unit).expect("replayed pass");
    pipeline.queue.ack(&delivery).expect("ack");

    assert_eq!(pipeline.drain_results(), 2);

    let job = pipeline.store.load_job(&job_id).expect("load").expect("job");
    assert_eq!(job.batches_completed, 1);
    assert_eq!(job.found_count, 1);
    assert_eq!(job.status, JobStatus::Completed);

    let rows = pipeline.store.report_rows(&job_id).expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].preimage.as_deref(), Some("050-1234567"));
}

/// Tests a subscriber sees progress then completion, then end-of-stream.
#[test]
fn subscriber_receives_progress_then_completed() {
    let pipeline = Pipeline::new(1000);
    let job_id =
        pipeline.intake.create_job("a1b2c3d4e5f6789012345678901234ab\n").expect("create");
    let mut receiver = pipeline.hub.subscribe(job_id);

    pipeline.drain_work();
    pipeline.drain_results();

    let first = receiver.try_recv().expect("progress event");
    assert!(matches!(first, JobEvent::Progress {
        batches_completed: 1,
        batches_expected: 1,
        found_count: 0,
    }));
    let second = receiver.try_recv().expect("completed event");
    assert!(matches!(second, JobEvent::Completed {
        job_id: completed,
    } if completed == job_id));
    assert!(receiver.try_recv().is_err());
}
