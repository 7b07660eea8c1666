// crates/preimage-broker/tests/wire_tests.rs
// ============================================================================
// Module: Wire Codec Tests
// Description: Frame encoding, version checks, and kind discrimination.
// Purpose: Validate fail-closed decoding of queue messages.
// Dependencies: preimage-broker, preimage-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises the versioned, type-tagged frame codec in
//! [`preimage_broker::wire`].

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use preimage_broker::QueueMessage;
use preimage_broker::WIRE_SCHEMA_VERSION;
use preimage_broker::WireError;
use preimage_broker::decode;
use preimage_broker::decode_result_envelope;
use preimage_broker::decode_work_unit;
use preimage_broker::encode;
use preimage_core::Fingerprint;
use preimage_core::JobId;
use preimage_core::ResultEnvelope;
use preimage_core::ResultMatch;
use preimage_core::WorkUnit;

/// Builds a small work unit for codec tests.
fn sample_unit() -> WorkUnit {
    WorkUnit {
        job_id: JobId::generate(),
        batch_index: 3,
        fingerprints: vec![
            Fingerprint::from_hex("a1b2c3d4e5f6789012345678901234ab").expect("fingerprint"),
        ],
    }
}

/// Tests a work unit frame round-trips through the codec.
#[test]
fn work_unit_round_trips() {
    let unit = sample_unit();
    let frame = encode(&QueueMessage::WorkUnit(unit.clone())).expect("encode");
    let decoded = decode_work_unit(&frame).expect("decode");
    assert_eq!(decoded, unit);
}

/// Tests a result envelope frame round-trips through the codec.
#[test]
fn result_envelope_round_trips() {
    let envelope = ResultEnvelope {
        job_id: JobId::generate(),
        batch_index: 0,
        matches: vec![ResultMatch {
            fingerprint: Fingerprint::from_hex("fedcba0987654321fedcba0987654321")
                .expect("fingerprint"),
            preimage: "050-1234567".to_string(),
        }],
    };
    let frame = encode(&QueueMessage::ResultEnvelope(envelope.clone())).expect("encode");
    let decoded = decode_result_envelope(&frame).expect("decode");
    assert_eq!(decoded, envelope);
}

/// Tests frames carry the schema version and the type tag.
#[test]
fn frame_carries_schema_and_type_tag() {
    let frame = encode(&QueueMessage::WorkUnit(sample_unit())).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&frame).expect("json");
    assert_eq!(value["schema"], u64::from(WIRE_SCHEMA_VERSION));
    assert_eq!(value["type"], "work_unit");
    assert!(value["payload"]["fingerprints"].is_array());
}

/// Tests an unknown schema version fails closed.
#[test]
fn unknown_schema_version_is_rejected() {
    let frame = encode(&QueueMessage::WorkUnit(sample_unit())).expect("encode");
    let bumped = frame.replace("\"schema\":1", "\"schema\":99");
    let result = decode(&bumped);
    assert!(matches!(result, Err(WireError::SchemaVersion(99))));
}

/// Tests a kind mismatch fails closed.
#[test]
fn unexpected_kind_is_rejected() {
    let frame = encode(&QueueMessage::WorkUnit(sample_unit())).expect("encode");
    let result = decode_result_envelope(&frame);
    assert!(matches!(result, Err(WireError::UnexpectedKind {
        ..
    })));
}

/// Tests malformed frames report a decode error.
#[test]
fn malformed_frame_is_rejected() {
    assert!(matches!(decode("not json"), Err(WireError::Decode(_))));
}
