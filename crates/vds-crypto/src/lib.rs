//! # vds-crypto — Proof Verification for Verifiable Logs and Maps
//!
//! Everything a client needs to decide whether to trust what a verifiable
//! data structure service tells it, given the bytes the service returned:
//!
//! - **Merkle primitives** (`merkle`): domain-separated leaf and node
//!   hashing shared by logs and maps.
//! - **Entries** (`entry`): how raw, JSON and redacted JSON entries map to
//!   leaf hashes.
//! - **Heads** (`head`): log and map tree heads, and the map state a client
//!   carries between polls.
//! - **Log proofs** (`log`): inclusion and consistency verification.
//! - **Audit** (`audit`): rebuilding a log root from every entry.
//! - **Map proofs** (`map`): 256-level sparse Merkle map inclusion.
//!
//! ## Crate Policy
//!
//! - Depends only on `vds-core` within the workspace.
//! - Pure and synchronous: no I/O, no blocking. Fetching proofs and entries
//!   is the caller's job; every function here takes them as arguments.
//! - The only shared state is the default-hash table for the sparse map,
//!   built once and read-only afterwards.

pub mod audit;
pub mod entry;
pub mod head;
pub mod log;
pub mod map;
pub mod merkle;

#[cfg(test)]
mod testing;

pub use audit::{audit_entries, AcceptAll, AuditCheckpoint, LogAuditor};
pub use entry::{
    EntryFormat, JsonEntry, MerkleTreeLeaf, RawDataEntry, RedactedJsonEntry, VerifiableEntry,
};
pub use head::{LogTreeHead, MapTreeHead, MapTreeState};
pub use log::{verify_consistency_between, LogConsistencyProof, LogInclusionProof};
pub use map::{
    default_leaf_values, key_path, verify_map_state, MapInclusionProof, MAP_TREE_DEPTH,
};
pub use merkle::{calc_k, is_power_of_two, leaf_hash, node_hash};
