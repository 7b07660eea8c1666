// crates/preimage-core/src/identifiers.rs
// ============================================================================
// Module: Preimage Identifiers
// Description: Strongly typed job and fingerprint identifiers.
// Purpose: Provide canonical, serializable keys shared by all components.
// Dependencies: serde, uuid, thiserror
// ============================================================================

//! ## Overview
//! Identifiers used throughout the lookup pipeline. A [`JobId`] is a random
//! 128-bit identifier minted at ingestion. A [`Fingerprint`] is the 16-byte
//! binary form of a 32-hex-character content identifier; its canonical string
//! form is lowercase hex, which is the form persisted and rendered in
//! artifacts.
//! Invariants:
//! - A `Fingerprint` is only constructed from exactly 32 hex characters.
//! - Fingerprint ordering is byte-lexicographic, which matches lexicographic
//!   ordering of the canonical hex form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Job Identifier
// ============================================================================

/// Job identifier minted at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mints a fresh random job identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(value)?))
    }
}

impl From<Uuid> for JobId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// Number of bytes in a fingerprint.
pub const FINGERPRINT_BYTES: usize = 16;
/// Number of hex characters in a fingerprint's string form.
pub const FINGERPRINT_HEX_CHARS: usize = FINGERPRINT_BYTES * 2;

/// Errors returned when parsing a fingerprint from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    /// Input was not exactly 32 characters long.
    #[error("fingerprint must be {FINGERPRINT_HEX_CHARS} hex characters, got {0}")]
    Length(usize),
    /// Input contained a non-hex character.
    #[error("fingerprint contains non-hex character at offset {0}")]
    NonHex(usize),
}

/// 16-byte binary fingerprint of an unknown preimage.
///
/// # Invariants
/// - Constructed only from exactly 32 hex characters or 16 raw bytes.
/// - The canonical string form is lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_BYTES]);

impl Fingerprint {
    /// Wraps 16 raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_BYTES]) -> Self {
        Self(bytes)
    }

    /// Parses a fingerprint from its 32-hex-character form.
    ///
    /// Accepts both uppercase and lowercase hex digits; the parsed value
    /// renders canonically as lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] when the input is not exactly 32 hex
    /// characters.
    pub fn from_hex(text: &str) -> Result<Self, FingerprintError> {
        let raw = text.as_bytes();
        if raw.len() != FINGERPRINT_HEX_CHARS {
            return Err(FingerprintError::Length(raw.len()));
        }
        let mut bytes = [0_u8; FINGERPRINT_BYTES];
        for (index, chunk) in raw.chunks_exact(2).enumerate() {
            let hi = hex_value(chunk[0]).ok_or(FingerprintError::NonHex(index * 2))?;
            let lo = hex_value(chunk[1]).ok_or(FingerprintError::NonHex(index * 2 + 1))?;
            bytes[index] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }

    /// Returns the raw 16-byte form.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    /// Returns the canonical lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(FINGERPRINT_HEX_CHARS);
        for byte in &self.0 {
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
        out
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_hex(value)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(DeError::custom)
    }
}

/// Returns the value of a single hex digit, if any.
const fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Fingerprint;
    use super::FingerprintError;

    #[test]
    fn fingerprint_parses_mixed_case_to_canonical_lowercase() {
        let parsed = Fingerprint::from_hex("A1B2C3D4E5F6789012345678901234AB").expect("parse");
        assert_eq!(parsed.to_hex(), "a1b2c3d4e5f6789012345678901234ab");
    }

    #[test]
    fn fingerprint_rejects_wrong_length() {
        assert_eq!(Fingerprint::from_hex("abc"), Err(FingerprintError::Length(3)));
    }

    #[test]
    fn fingerprint_rejects_non_hex() {
        let result = Fingerprint::from_hex("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz");
        assert_eq!(result, Err(FingerprintError::NonHex(0)));
    }

    #[test]
    fn fingerprint_ordering_matches_hex_ordering() {
        let low = Fingerprint::from_hex("00000000000000000000000000000001").expect("parse");
        let high = Fingerprint::from_hex("ff000000000000000000000000000000").expect("parse");
        assert!(low < high);
        assert!(low.to_hex() < high.to_hex());
    }
}
