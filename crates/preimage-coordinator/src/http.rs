// crates/preimage-coordinator/src/http.rs
// ============================================================================
// Module: Coordinator HTTP Surface
// Description: Job API routes: upload, status, events, and results.
// Purpose: Expose the job pipeline under /api/jobs.
// Dependencies: axum, preimage-core, tokio
// ============================================================================

//! ## Overview
//! The HTTP surface drives ingestion and serves status queries, the live
//! event stream, and the CSV artifact. Handlers are ordinary synchronous
//! calls into the services; the bus is the asynchronous boundary, so upload
//! returns 202 as soon as every unit is durably enqueued. Client errors map
//! to 400/404 and internal failures to 500.
//! Invariants:
//! - Upload responds only after the last work unit is enqueued.
//! - The event stream emits `message`-named events carrying
//!   `{type, payload}` JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::Multipart;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::routing::get;
use axum::routing::post;
use preimage_core::JobId;
use preimage_core::JobStore;
use preimage_core::SharedJobStore;
use thiserror::Error;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::error;
use uuid::Uuid;

use crate::artifact::artifact_filename;
use crate::artifact::render_csv;
use crate::events::EventHub;
use crate::ingest::JobIntake;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted upload size in bytes.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

// ============================================================================
// SECTION: Server Errors
// ============================================================================

/// Errors returned when serving the HTTP surface.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Bind address was invalid.
    #[error("invalid bind address: {0}")]
    Bind(String),
    /// Server failed while running.
    #[error("http server failed: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared state for the job API handlers.
pub struct AppState {
    /// Durable job store.
    pub store: SharedJobStore,
    /// Ingestion service.
    pub intake: JobIntake,
    /// Subscriber fan-out.
    pub hub: Arc<EventHub>,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the job API router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/jobs", post(upload_job).get(list_jobs))
        .route("/api/jobs/{job_id}", get(get_job))
        .route("/api/jobs/{job_id}/events", get(job_events))
        .route("/api/jobs/{job_id}/results", get(job_results))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serves the job API on the configured bind address.
///
/// # Errors
///
/// Returns [`ServeError`] when the bind address is invalid or the server
/// fails.
pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<(), ServeError> {
    let addr: SocketAddr = bind.parse().map_err(|_| ServeError::Bind(bind.to_string()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ServeError::Transport(err.to_string()))?;
    axum::serve(listener, router(state))
        .await
        .map_err(|err| ServeError::Transport(err.to_string()))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Accepts a multipart upload and creates a job from its `file` field.
async fn upload_job(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<String> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    match field.bytes().await {
                        Ok(bytes) => {
                            upload = Some(String::from_utf8_lossy(&bytes).into_owned());
                            break;
                        }
                        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
                    }
                }
            }
            Ok(None) => break,
            Err(_) => return StatusCode::BAD_REQUEST.into_response(),
        }
    }
    let Some(upload) = upload else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match state.intake.create_job(&upload) {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "jobId": job_id,
            })),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "job creation failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Lists completed jobs, newest first.
async fn list_jobs(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_completed() {
        Ok(jobs) => Json(jobs).into_response(),
        Err(err) => {
            error!(error = %err, "job listing failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Returns one job row, or 404 when absent.
async fn get_job(State(state): State<Arc<AppState>>, Path(job_id): Path<Uuid>) -> Response {
    match state.store.load_job(&JobId::from_uuid(job_id)) {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(error = %err, "job status query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Opens the live event stream for a job.
async fn job_events(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.hub.subscribe(JobId::from_uuid(job_id));
    let stream = ReceiverStream::new(receiver).map(|event| {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event("message").data(payload))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Streams the job's CSV artifact, or 404 when the job is absent.
async fn job_results(State(state): State<Arc<AppState>>, Path(job_id): Path<Uuid>) -> Response {
    let job_id = JobId::from_uuid(job_id);
    match state.store.load_job(&job_id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(error = %err, "job lookup for artifact failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    match state.store.report_rows(&job_id) {
        Ok(rows) => {
            let disposition = format!("attachment; filename=\"{}\"", artifact_filename(&job_id));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                render_csv(&rows),
            )
                .into_response()
        }
        Err(err) => {
            error!(error = %err, "artifact generation failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
