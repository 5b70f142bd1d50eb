//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used by every verification path. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every failure is terminal for the call that produced it. Nothing in
//!   this workspace retries; callers treat any error as "do not trust this
//!   head or value".
//! - Canonicalization errors describe the offending value.
//! - Verification errors carry the sizes and indices involved so that a
//!   rejected proof can be diagnosed from the error alone.

use thiserror::Error;

/// Top-level error type for the workspace.
#[derive(Error, Debug)]
pub enum VdsError {
    /// Canonicalization of a structured value failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A proof or head did not verify.
    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Error while computing an object hash or shedding redactability.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float normalization did not terminate, exceeded its length guard,
    /// or the value is not a finite number.
    #[error("malformed number: {0}")]
    MalformedNumber(String),

    /// The value cannot be represented as a canonical value.
    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// A redacted placeholder or nonce tuple had an unexpected shape.
    #[error("unrecognized value where a redacted placeholder was expected: {0}")]
    RedactionFormat(String),

    /// A hash received at the boundary was not valid hex or base64, or
    /// not 32 bytes long.
    #[error("invalid hash encoding: {0}")]
    HashEncoding(String),

    /// Input text was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Error while verifying a proof, a tree head, or an audited log range.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// An index or size lies outside the bounds permitted for the given head.
    #[error("proof out of range: {0}")]
    ProofRange(String),

    /// A computed hash did not match the expected value.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// The audited entries did not cover the requested index range exactly.
    #[error("not all entries returned: expected {expected} entries, received {received}")]
    IncompleteAuditRange {
        /// Number of entries needed to reach the target head.
        expected: u64,
        /// Number of entries supplied. Counting stops at `expected + 1`.
        received: u64,
    },

    /// An entry's leaf hash could not be computed.
    #[error("entry canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The caller's auditor rejected the content of an entry.
    #[error("auditor rejected entry {index}: {reason}")]
    AuditorRejected {
        /// Log index of the rejected entry.
        index: u64,
        /// Reason given by the auditor.
        reason: String,
    },
}

/// Error while loading verifier configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable held a value that cannot be used.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// Name of the environment variable.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}
