// crates/preimage-coordinator/src/main.rs
// ============================================================================
// Module: Coordinator Entry Point
// Description: Coordinator binary wiring storage, bus, and HTTP together.
// Purpose: Run the job pipeline's single logical coordinator instance.
// Dependencies: clap, preimage-config, tokio, tracing-subscriber
// ============================================================================

//! ## Overview
//! Loads configuration, connects the Postgres store and queue, spawns the
//! results consumer pool, and serves the job API until the process exits.

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
use preimage_coordinator::AppState;
use preimage_coordinator::EventHub;
use preimage_coordinator::JobIntake;
use preimage_coordinator::ResultAggregator;
use preimage_coordinator::results_handler;
use preimage_coordinator::serve;
use preimage_store_postgres::shared_postgres_stores;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Coordinator command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "preimage-coordinator")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "coordinator failed");
            ExitCode::FAILURE
        }
    }
}

/// Builds and runs the coordinator until the server exits.
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServiceConfig::load(args.config.as_deref())?;
    let (job_store, _mapping) = shared_postgres_stores(&config.storage)?;
    let queue = SharedQueue::from_queue(PostgresQueue::new(&config.queue.postgres)?);
    let hub = Arc::new(EventHub::new());

    let aggregator =
        Arc::new(ResultAggregator::new(job_store.clone(), Arc::clone(&hub)));
    let results_pool = ConsumerPool::spawn(
        queue.clone(),
        ConsumerPoolConfig {
            queue: QueueName::Results,
            concurrency: config.coordinator.results_concurrency,
            poll_interval: Duration::from_millis(config.queue.poll_interval_ms),
            lease: Duration::from_millis(config.queue.lease_ms),
        },
        results_handler(aggregator),
    );

    let state = Arc::new(AppState {
        store: job_store.clone(),
        intake: JobIntake::new(
            job_store,
            queue,
            Arc::clone(&hub),
            config.coordinator.partition_size,
        ),
        hub,
    });
    info!(bind = %config.coordinator.bind, "coordinator listening");
    let served = serve(state, &config.coordinator.bind).await;
    results_pool.shutdown();
    served?;
    Ok(())
}
