// crates/preimage-core/src/store.rs
// ============================================================================
// Module: Store Interfaces
// Description: Job and mapping store traits with in-memory references.
// Purpose: Define the persistence seams the pipeline is built against.
// Dependencies: chrono, thiserror
// ============================================================================

//! ## Overview
//! [`JobStore`] owns job rows, their fixed target sets, discovered results,
//! and the processed-batch ledger used to make aggregation idempotent.
//! [`MappingStore`] is the read-only precomputed fingerprint-to-preimage
//! mapping. The in-memory implementations mirror the relational semantics
//! (including referential integrity) and back the hermetic pipeline tests.
//! Invariants:
//! - Result rows never exist without a matching job row.
//! - `apply_envelope` advances counters at most once per `(job, batch_index)`.
//! - A completed job's counters and status never change again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use crate::envelope::ResultMatch;
use crate::identifiers::Fingerprint;
use crate::identifiers::JobId;
use crate::job::JobProgress;
use crate::job::JobRecord;
use crate::job::JobStatus;
use crate::job::ProgressOutcome;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Errors returned by job and mapping stores.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("store io error: {0}")]
    Io(String),
    /// Stored or supplied data was invalid.
    #[error("store invalid data: {0}")]
    Invalid(String),
    /// A relational constraint was violated.
    #[error("store constraint violation: {0}")]
    Constraint(String),
}

// ============================================================================
// SECTION: Report Rows
// ============================================================================

/// One line of the downloadable result artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Requested fingerprint.
    pub fingerprint: Fingerprint,
    /// Recovered preimage, when the mapping contained the fingerprint.
    pub preimage: Option<String>,
}

// ============================================================================
// SECTION: Job Store Interface
// ============================================================================

/// Durable store for jobs, targets, results, and the processed-batch ledger.
pub trait JobStore: Send + Sync {
    /// Persists a new job row and its target set in one logical unit.
    ///
    /// Duplicate fingerprints collapse to a single target row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when persistence fails or the job already
    /// exists.
    fn create_job(&self, job: &JobRecord, targets: &[Fingerprint]) -> Result<(), StoreError>;

    /// Loads a job row by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn load_job(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError>;

    /// Lists completed jobs, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list_completed(&self) -> Result<Vec<JobRecord>, StoreError>;

    /// Applies one result envelope's accounting to a job.
    ///
    /// The `(job, batch_index)` pair is recorded in the processed-batch
    /// ledger; a pair seen before yields [`ProgressOutcome::DuplicateBatch`]
    /// without touching counters. Crossing the completion threshold flips the
    /// job to `COMPLETED` exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction fails.
    fn apply_envelope(
        &self,
        job_id: &JobId,
        batch_index: u64,
        found: u64,
    ) -> Result<ProgressOutcome, StoreError>;

    /// Inserts discovered matches for a job, ignoring duplicates.
    ///
    /// Returns the number of rows actually inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] when the job does not exist.
    fn insert_results(&self, job_id: &JobId, matches: &[ResultMatch]) -> Result<u64, StoreError>;

    /// Returns one row per target, left-joined with any discovered result,
    /// ordered lexicographically ascending by fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn report_rows(&self, job_id: &JobId) -> Result<Vec<ReportRow>, StoreError>;
}

// ============================================================================
// SECTION: Mapping Store Interface
// ============================================================================

/// Read-only precomputed fingerprint-to-preimage mapping.
pub trait MappingStore: Send + Sync {
    /// Resolves every supplied fingerprint present in the mapping.
    ///
    /// Implementations must issue a single batched lookup per call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn lookup(&self, fingerprints: &[Fingerprint]) -> Result<Vec<ResultMatch>, StoreError>;
}

// ============================================================================
// SECTION: In-Memory Job Store
// ============================================================================

/// Relational tables held under one lock.
#[derive(Debug, Default)]
struct JobTables {
    /// Job rows keyed by identifier.
    jobs: BTreeMap<JobId, JobRecord>,
    /// Target sets keyed by job.
    targets: BTreeMap<JobId, BTreeSet<Fingerprint>>,
    /// Discovered results keyed by `(job, fingerprint)`.
    results: BTreeMap<(JobId, Fingerprint), String>,
    /// Processed-batch ledger.
    processed: BTreeSet<(JobId, u64)>,
}

/// In-memory [`JobStore`] mirroring the relational semantics.
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    /// Tables protected by a mutex.
    tables: Arc<Mutex<JobTables>>,
}

impl InMemoryJobStore {
    /// Creates an empty in-memory job store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn create_job(&self, job: &JobRecord, targets: &[Fingerprint]) -> Result<(), StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Io("job store mutex poisoned".to_string()))?;
        if tables.jobs.contains_key(&job.job_id) {
            return Err(StoreError::Constraint(format!("job {} already exists", job.job_id)));
        }
        tables.jobs.insert(job.job_id, job.clone());
        tables.targets.insert(job.job_id, targets.iter().copied().collect());
        Ok(())
    }

    fn load_job(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Io("job store mutex poisoned".to_string()))?;
        Ok(tables.jobs.get(job_id).cloned())
    }

    fn list_completed(&self) -> Result<Vec<JobRecord>, StoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Io("job store mutex poisoned".to_string()))?;
        let mut completed: Vec<JobRecord> = tables
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Completed)
            .cloned()
            .collect();
        completed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(completed)
    }

    fn apply_envelope(
        &self,
        job_id: &JobId,
        batch_index: u64,
        found: u64,
    ) -> Result<ProgressOutcome, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Io("job store mutex poisoned".to_string()))?;
        if !tables.jobs.contains_key(job_id) {
            return Ok(ProgressOutcome::UnknownJob);
        }
        if !tables.processed.insert((*job_id, batch_index)) {
            return Ok(ProgressOutcome::DuplicateBatch);
        }
        let job = tables
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::Io("job row vanished mid-update".to_string()))?;
        job.batches_completed += 1;
        job.found_count += found;
        let newly_completed =
            job.status == JobStatus::Running && job.batches_completed >= job.batches_expected;
        if newly_completed {
            job.status = JobStatus::Completed;
        }
        Ok(ProgressOutcome::Advanced(JobProgress {
            batches_completed: job.batches_completed,
            batches_expected: job.batches_expected,
            found_count: job.found_count,
            newly_completed,
        }))
    }

    fn insert_results(&self, job_id: &JobId, matches: &[ResultMatch]) -> Result<u64, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Io("job store mutex poisoned".to_string()))?;
        if !tables.jobs.contains_key(job_id) {
            return Err(StoreError::Constraint(format!("no job row for {job_id}")));
        }
        let mut inserted = 0_u64;
        for item in matches {
            let key = (*job_id, item.fingerprint);
            if let std::collections::btree_map::Entry::Vacant(entry) = tables.results.entry(key) {
                entry.insert(item.preimage.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn report_rows(&self, job_id: &JobId) -> Result<Vec<ReportRow>, StoreError> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Io("job store mutex poisoned".to_string()))?;
        let Some(targets) = tables.targets.get(job_id) else {
            return Ok(Vec::new());
        };
        Ok(targets
            .iter()
            .map(|fingerprint| ReportRow {
                fingerprint: *fingerprint,
                preimage: tables.results.get(&(*job_id, *fingerprint)).cloned(),
            })
            .collect())
    }
}

// ============================================================================
// SECTION: In-Memory Mapping Store
// ============================================================================

/// In-memory [`MappingStore`] for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMappingStore {
    /// Mapping entries protected by a mutex.
    entries: Arc<Mutex<BTreeMap<Fingerprint, String>>>,
}

impl InMemoryMappingStore {
    /// Creates an empty in-memory mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads one mapping entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the mapping lock is poisoned.
    pub fn insert(
        &self,
        fingerprint: Fingerprint,
        preimage: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Io("mapping store mutex poisoned".to_string()))?
            .insert(fingerprint, preimage.into());
        Ok(())
    }
}

impl MappingStore for InMemoryMappingStore {
    fn lookup(&self, fingerprints: &[Fingerprint]) -> Result<Vec<ResultMatch>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("mapping store mutex poisoned".to_string()))?;
        Ok(fingerprints
            .iter()
            .filter_map(|fingerprint| {
                entries.get(fingerprint).map(|preimage| ResultMatch {
                    fingerprint: *fingerprint,
                    preimage: preimage.clone(),
                })
            })
            .collect())
    }
}

// ============================================================================
// SECTION: Shared Store Wrappers
// ============================================================================

/// Shared job store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedJobStore {
    /// Inner store implementation.
    inner: Arc<dyn JobStore>,
}

impl SharedJobStore {
    /// Wraps a job store in a shared, clonable handle.
    #[must_use]
    pub fn from_store(store: impl JobStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl JobStore for SharedJobStore {
    fn create_job(&self, job: &JobRecord, targets: &[Fingerprint]) -> Result<(), StoreError> {
        self.inner.create_job(job, targets)
    }

    fn load_job(&self, job_id: &JobId) -> Result<Option<JobRecord>, StoreError> {
        self.inner.load_job(job_id)
    }

    fn list_completed(&self) -> Result<Vec<JobRecord>, StoreError> {
        self.inner.list_completed()
    }

    fn apply_envelope(
        &self,
        job_id: &JobId,
        batch_index: u64,
        found: u64,
    ) -> Result<ProgressOutcome, StoreError> {
        self.inner.apply_envelope(job_id, batch_index, found)
    }

    fn insert_results(&self, job_id: &JobId, matches: &[ResultMatch]) -> Result<u64, StoreError> {
        self.inner.insert_results(job_id, matches)
    }

    fn report_rows(&self, job_id: &JobId) -> Result<Vec<ReportRow>, StoreError> {
        self.inner.report_rows(job_id)
    }
}

/// Shared mapping store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedMappingStore {
    /// Inner mapping implementation.
    inner: Arc<dyn MappingStore>,
}

impl SharedMappingStore {
    /// Wraps a mapping store in a shared, clonable handle.
    #[must_use]
    pub fn from_store(store: impl MappingStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn MappingStore>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl MappingStore for SharedMappingStore {
    fn lookup(&self, fingerprints: &[Fingerprint]) -> Result<Vec<ResultMatch>, StoreError> {
        self.inner.lookup(fingerprints)
    }
}
