//! # Hash256 — 32-Byte SHA-256 Values
//!
//! Every hash handled by the verifiers (object hashes, leaf hashes, node
//! hashes, tree roots) is a `Hash256`. Values are compared by exact byte
//! equality and are `Copy`.
//!
//! The remote service transmits hashes as base64 in JSON bodies and as hex
//! in URLs and headers. Both encodings are decoded at the boundary through
//! the constructors here; the serde representation is standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CanonicalizationError;

/// Length in bytes of every hash in the system.
pub const HASH_LEN: usize = 32;

/// An opaque 32-byte SHA-256 output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256([u8; HASH_LEN]);

impl Hash256 {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// SHA-256 over the concatenation of `parts`.
    ///
    /// All hash constructions in the workspace are a one-byte domain tag
    /// followed by payload, so callers pass the tag and payload separately
    /// instead of allocating a joined buffer.
    pub fn sha256(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    /// Build from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CanonicalizationError> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            CanonicalizationError::HashEncoding(format!(
                "expected {HASH_LEN} hash bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Decode a 64-character hex string (either case). Surrounding
    /// whitespace is rejected.
    pub fn from_hex(s: &str) -> Result<Self, CanonicalizationError> {
        let bytes = hex::decode(s).map_err(|e| {
            CanonicalizationError::HashEncoding(format!("invalid hex digest: {e}"))
        })?;
        Self::from_slice(&bytes)
    }

    /// Decode standard (padded) base64.
    pub fn from_base64(s: &str) -> Result<Self, CanonicalizationError> {
        let bytes = STANDARD.decode(s).map_err(|e| {
            CanonicalizationError::HashEncoding(format!("invalid base64 digest: {e}"))
        })?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Standard base64 rendering, as used in service JSON bodies.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Hash256 {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}
