//! # Merkle Tree Hash Primitives
//!
//! Domain-separated SHA-256 as used by the log and map trees:
//! - Leaf: `SHA256(0x00 || data)`.
//! - Node: `SHA256(0x01 || left || right)`.
//!
//! ## Security Invariant
//!
//! The one-byte prefix separates the leaf and node domains, so no leaf
//! preimage can be reinterpreted as an internal node (or the reverse) to
//! forge a second preimage of a root.

use vds_core::Hash256;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Compute the Merkle tree leaf hash: `SHA256(0x00 || data)`.
pub fn leaf_hash(data: &[u8]) -> Hash256 {
    Hash256::sha256(&[&[LEAF_PREFIX], data])
}

/// Compute a parent node hash: `SHA256(0x01 || left || right)`.
pub fn node_hash(left: &Hash256, right: &Hash256) -> Hash256 {
    Hash256::sha256(&[&[NODE_PREFIX], left.as_bytes(), right.as_bytes()])
}

/// Largest power of two strictly less than `n` (1 when `n <= 2`).
///
/// This is the split point of a tree of `n` leaves: the left subtree holds
/// `calc_k(n)` leaves and is always complete.
pub fn calc_k(n: u64) -> u64 {
    let mut k: u64 = 1;
    // `k < ceil(n / 2)` is `(k << 1) < n` without overflow at the top bit.
    while k < n - n / 2 {
        k <<= 1;
    }
    k
}

/// Whether `n` is an exact power of two (zero is not).
pub fn is_power_of_two(n: u64) -> bool {
    match n.checked_add(1) {
        Some(next) => n > 0 && calc_k(next) == n,
        // u64::MAX has every bit set.
        None => false,
    }
}
