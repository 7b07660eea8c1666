// crates/preimage-worker/src/main.rs
// ============================================================================
// Module: Worker Entry Point
// Description: Worker binary running a pool of work-unit consumers.
// Purpose: Scale fingerprint resolution horizontally.
// Dependencies: clap, preimage-config, tracing-subscriber
// ============================================================================

//! ## Overview
//! Loads configuration, connects the Postgres store and queue, and runs the
//! configured number of work consumers until the process is torn down.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use preimage_broker::ConsumerPool;
use preimage_broker::ConsumerPoolConfig;
use preimage_broker::PostgresQueue;
use preimage_broker::QueueName;
use preimage_broker::SharedQueue;
use preimage_config::ServiceConfig;
use preimage_store_postgres::shared_postgres_stores;
use preimage_worker::UnitProcessor;
use preimage_worker::work_handler;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Worker command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "preimage-worker")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "worker failed");
            ExitCode::FAILURE
        }
    }
}

/// Builds and runs the worker's consumer pool until process teardown.
fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServiceConfig::load(args.config.as_deref())?;
    let (job_store, mapping) = shared_postgres_stores(&config.storage)?;
    let queue = SharedQueue::from_queue(PostgresQueue::new(&config.queue.postgres)?);
    let processor = Arc::new(UnitProcessor::new(job_store, mapping, queue.clone()));
    info!(concurrency = config.worker.concurrency, "worker consuming work queue");
    let pool = ConsumerPool::spawn(
        queue,
        ConsumerPoolConfig {
            queue: QueueName::Work,
            concurrency: config.worker.concurrency,
            poll_interval: Duration::from_millis(config.queue.poll_interval_ms),
            lease: Duration::from_millis(config.queue.lease_ms),
        },
        work_handler(processor),
    );
    pool.join();
    Ok(())
}
