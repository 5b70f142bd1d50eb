//! # Sparse Merkle Map Proofs
//!
//! The map is a complete binary tree of depth 256 whose leaves are indexed
//! by `SHA256(key)`, most significant bit nearest the root. Almost every
//! subtree is empty, and an empty subtree at a given depth always has the
//! same hash, so the service only transmits the siblings along a key's path
//! that are not empty. The verifier fills the gaps from a fixed table.
//!
//! ```text
//! default[256] = leaf_hash("")
//! default[i]   = node_hash(default[i + 1], default[i + 1])
//! ```
//!
//! An absent key is proven the same way as a present one, with the empty
//! leaf hash `default[256]` as its value.

use std::sync::OnceLock;

use vds_core::{Hash256, VerificationError};

use crate::entry::MerkleTreeLeaf;
use crate::head::{LogTreeHead, MapTreeHead, MapTreeState};
use crate::log::{verify_consistency_between, LogConsistencyProof, LogInclusionProof};
use crate::merkle::{leaf_hash, node_hash};

/// Depth of the sparse Merkle tree; one level per bit of SHA-256.
pub const MAP_TREE_DEPTH: usize = 256;

/// The routing bits of `key`: bit `i` of `SHA256(key)`, big-endian, so that
/// index 0 is the most significant bit. `true` routes right.
pub fn key_path(key: &[u8]) -> [bool; MAP_TREE_DEPTH] {
    let digest = Hash256::sha256(&[key]);
    let mut path = [false; MAP_TREE_DEPTH];
    for (i, byte) in digest.as_bytes().iter().enumerate() {
        for j in 0..8 {
            path[i * 8 + 7 - j] = (byte >> j) & 1 == 1;
        }
    }
    path
}

/// Hash of an empty subtree rooted at each depth, `0..=256`.
pub fn default_leaf_values() -> &'static [Hash256; MAP_TREE_DEPTH + 1] {
    static TABLE: OnceLock<[Hash256; MAP_TREE_DEPTH + 1]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [Hash256::default(); MAP_TREE_DEPTH + 1];
        table[MAP_TREE_DEPTH] = leaf_hash(b"");
        for i in (0..MAP_TREE_DEPTH).rev() {
            table[i] = node_hash(&table[i + 1], &table[i + 1]);
        }
        table
    })
}

/// Proof that a key holds a value (or is absent) in a map of a given size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInclusionProof {
    /// The map key; its SHA-256 selects the leaf.
    pub key: Vec<u8>,
    /// Leaf hash of the value; `leaf_hash("")` for an absent key.
    pub value_leaf_hash: Hash256,
    /// Size of the mutation log behind the map head the proof was issued
    /// for.
    pub tree_size: u64,
    /// Sibling at each depth, index 0 nearest the root. `None` is an empty
    /// subtree.
    pub audit_path: [Option<Hash256>; MAP_TREE_DEPTH],
}

impl MapInclusionProof {
    /// Build a proof from the populated siblings only, as `(depth, hash)`
    /// pairs.
    ///
    /// # Errors
    ///
    /// `ProofRange` if a depth is `>= 256` or appears twice.
    pub fn from_sparse(
        key: Vec<u8>,
        value_leaf_hash: Hash256,
        tree_size: u64,
        entries: impl IntoIterator<Item = (usize, Hash256)>,
    ) -> Result<Self, VerificationError> {
        let mut audit_path = [None; MAP_TREE_DEPTH];
        for (depth, hash) in entries {
            let slot = audit_path.get_mut(depth).ok_or_else(|| {
                VerificationError::ProofRange(format!(
                    "map proof depth {depth} exceeds tree depth {MAP_TREE_DEPTH}"
                ))
            })?;
            if slot.replace(hash).is_some() {
                return Err(VerificationError::ProofRange(format!(
                    "map proof supplies depth {depth} twice"
                )));
            }
        }
        Ok(Self {
            key,
            value_leaf_hash,
            tree_size,
            audit_path,
        })
    }

    /// Fold the value up the key's path to the implied map root.
    pub fn compute_root(&self) -> Hash256 {
        let path = key_path(&self.key);
        let defaults = default_leaf_values();
        let mut t = self.value_leaf_hash;
        for i in (0..MAP_TREE_DEPTH).rev() {
            let sibling = self.audit_path[i].unwrap_or(defaults[i + 1]);
            t = if path[i] {
                node_hash(&sibling, &t)
            } else {
                node_hash(&t, &sibling)
            };
        }
        t
    }

    /// Verify the proof against a map head.
    ///
    /// # Errors
    ///
    /// `VerificationFailed` if the proof is for another map size or the
    /// computed root differs from `head.root_hash`.
    pub fn verify(&self, head: &MapTreeHead) -> Result<(), VerificationError> {
        if head.tree_size() != self.tree_size {
            return Err(VerificationError::VerificationFailed(format!(
                "map proof is for size {}, head has size {}",
                self.tree_size,
                head.tree_size()
            )));
        }
        if self.compute_root() != head.root_hash {
            tracing::warn!(tree_size = self.tree_size, "map inclusion root mismatch");
            return Err(VerificationError::VerificationFailed(format!(
                "map proof does not reproduce root of map size {}",
                self.tree_size
            )));
        }
        tracing::debug!(tree_size = self.tree_size, "map inclusion proof verified");
        Ok(())
    }

    /// Verify the proof against `state` and that `entry` is the proven
    /// value, returning the entry.
    pub fn verified_value<E: MerkleTreeLeaf>(
        &self,
        entry: E,
        state: &MapTreeState,
    ) -> Result<E, VerificationError> {
        self.verify(&state.map_head)?;
        if entry.leaf_hash()? != self.value_leaf_hash {
            return Err(VerificationError::VerificationFailed(
                "map value does not match the proven leaf hash".to_string(),
            ));
        }
        Ok(entry)
    }
}

/// Establish a new trusted map state.
///
/// - With `prev`, the mutation log must be consistent between
///   `prev.map_head` and `map_head`, and the tree-head log consistent
///   between `prev.tree_head_log_head` and `tree_head_log_head`. An empty
///   previous log is trivially consistent and needs no proof.
/// - `map_head` must be included in the newer of the two tree-head log
///   heads, by `inclusion`.
pub fn verify_map_state(
    prev: Option<&MapTreeState>,
    map_head: MapTreeHead,
    mutation_consistency: Option<&LogConsistencyProof>,
    tree_head_log_head: LogTreeHead,
    tree_head_log_consistency: Option<&LogConsistencyProof>,
    inclusion: &LogInclusionProof,
) -> Result<MapTreeState, VerificationError> {
    let mut trusted_log_head = tree_head_log_head;
    if let Some(prev) = prev {
        let prev_mutations = &prev.map_head.mutation_log_head;
        if prev_mutations.tree_size > 0 {
            verify_consistency_between(
                prev_mutations,
                &map_head.mutation_log_head,
                mutation_consistency,
            )?;
        }
        let prev_log = &prev.tree_head_log_head;
        if prev_log.tree_size > 0 {
            verify_consistency_between(prev_log, &tree_head_log_head, tree_head_log_consistency)?;
        }
        trusted_log_head = *LogTreeHead::newer_of(Some(prev_log), &tree_head_log_head);
    }

    inclusion.verify_leaf(&trusted_log_head, &map_head)?;
    tracing::debug!(
        map_size = map_head.tree_size(),
        tree_head_log_size = trusted_log_head.tree_size,
        "map state verified"
    );
    Ok(MapTreeState {
        map_head,
        tree_head_log_head: trusted_log_head,
    })
}
