// crates/preimage-broker/src/wire.rs
// ============================================================================
// Module: Queue Wire Codec
// Description: Versioned, type-tagged serialization for queue messages.
// Purpose: Encode work units and result envelopes fail-closed.
// Dependencies: preimage-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every queue message is a JSON frame carrying a schema version and a
//! `type` discriminator (`work_unit` or `result_envelope`). Decoding fails
//! closed: unknown versions and unexpected discriminators are codec errors,
//! never silent coercions.
//! Invariants:
//! - `WIRE_SCHEMA_VERSION` changes whenever the frame layout changes.
//! - A frame decodes to exactly the message kind its tag declares.

// ============================================================================
// SECTION: Imports
// ============================================================================

use preimage_core::ResultEnvelope;
use preimage_core::WorkUnit;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Codec Errors
// ============================================================================

/// Errors produced by the wire codec.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame failed to serialize.
    #[error("wire encode failure: {0}")]
    Encode(String),
    /// Frame failed to parse.
    #[error("wire decode failure: {0}")]
    Decode(String),
    /// Frame carried an unsupported schema version.
    #[error("unsupported wire schema version {0} (expected {WIRE_SCHEMA_VERSION})")]
    SchemaVersion(u32),
    /// Frame carried a message kind the consumer does not accept.
    #[error("unexpected message kind {actual} (expected {expected})")]
    UnexpectedKind {
        /// Kind the consumer expected.
        expected: &'static str,
        /// Kind the frame declared.
        actual: &'static str,
    },
}

// ============================================================================
// SECTION: Frame Types
// ============================================================================

/// Current wire schema version.
pub const WIRE_SCHEMA_VERSION: u32 = 1;

/// Message kinds carried over the queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum QueueMessage {
    /// Coordinator-to-worker dispatch unit.
    WorkUnit(WorkUnit),
    /// Worker-to-coordinator result record.
    ResultEnvelope(ResultEnvelope),
}

impl QueueMessage {
    /// Returns the wire discriminator for this message.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WorkUnit(_) => "work_unit",
            Self::ResultEnvelope(_) => "result_envelope",
        }
    }
}

/// Versioned frame wrapping a queue message.
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    /// Schema version of the frame layout.
    schema: u32,
    /// Tagged message body.
    #[serde(flatten)]
    message: QueueMessage,
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Encodes a queue message into its wire frame.
///
/// # Errors
///
/// Returns [`WireError::Encode`] when serialization fails.
pub fn encode(message: &QueueMessage) -> Result<String, WireError> {
    serde_json::to_string(&WireFrame {
        schema: WIRE_SCHEMA_VERSION,
        message: message.clone(),
    })
    .map_err(|err| WireError::Encode(err.to_string()))
}

/// Decodes a wire frame into a queue message.
///
/// # Errors
///
/// Returns [`WireError::Decode`] on malformed frames and
/// [`WireError::SchemaVersion`] on version mismatch.
pub fn decode(text: &str) -> Result<QueueMessage, WireError> {
    let frame: WireFrame =
        serde_json::from_str(text).map_err(|err| WireError::Decode(err.to_string()))?;
    if frame.schema != WIRE_SCHEMA_VERSION {
        return Err(WireError::SchemaVersion(frame.schema));
    }
    Ok(frame.message)
}

/// Decodes a frame that must carry a work unit.
///
/// # Errors
///
/// Returns [`WireError::UnexpectedKind`] when the frame carries anything
/// else.
pub fn decode_work_unit(text: &str) -> Result<WorkUnit, WireError> {
    match decode(text)? {
        QueueMessage::WorkUnit(unit) => Ok(unit),
        other => Err(WireError::UnexpectedKind {
            expected: "work_unit",
            actual: other.kind(),
        }),
    }
}

/// Decodes a frame that must carry a result envelope.
///
/// # Errors
///
/// Returns [`WireError::UnexpectedKind`] when the frame carries anything
/// else.
pub fn decode_result_envelope(text: &str) -> Result<ResultEnvelope, WireError> {
    match decode(text)? {
        QueueMessage::ResultEnvelope(envelope) => Ok(envelope),
        other => Err(WireError::UnexpectedKind {
            expected: "result_envelope",
            actual: other.kind(),
        }),
    }
}
