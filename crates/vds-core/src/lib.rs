//! # vds-core — Foundational Types for Verifiable Data Structure Clients
//!
//! This crate is the leaf of the workspace. It defines the value types and
//! the canonical object hash that every verification path builds on. It
//! performs no I/O.
//!
//! ## Key Design Principles
//!
//! 1. **`Hash256` everywhere.** Object hashes, leaf hashes, node hashes and
//!    tree roots are all the same 32-byte newtype, compared by exact byte
//!    equality. Hex and base64 decoding happen once, at the boundary.
//!
//! 2. **Closed `CanonicalValue` sum type.** Lists and dicts are distinct
//!    variants, so the object hash can never confuse `[]` with `{}`.
//!
//! 3. **Redaction is a parameter, not a mode.** Every hashing entry point
//!    takes the redaction prefix explicitly (or through an `ObjectHasher`
//!    built from `VerifierConfig`).
//!
//! 4. **Typed errors.** Each failure kind is a distinct variant; nothing is
//!    retried inside this crate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vds-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod digest;
pub mod error;
pub mod objecthash;
pub mod redaction;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use config::VerifierConfig;
pub use digest::{Hash256, HASH_LEN};
pub use error::{CanonicalizationError, ConfigError, VdsError, VerificationError};
pub use objecthash::{
    normalize_float, object_hash, object_hash_with_redaction, object_hash_with_std_redaction,
    unicode_normalization_available, ObjectHasher, REDACTED_PREFIX,
};
pub use redaction::{shed_redactability, shed_std_redactability};
pub use value::CanonicalValue;
