//! # Tree Heads
//!
//! A tree head is the service's signed-off commitment to the state of a log
//! or map at some size. Heads are only trusted after a proof links them to a
//! head that is already trusted; this module holds the value types, the
//! proofs live in [`crate::log`] and [`crate::map`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vds_core::{object_hash, CanonicalValue, Hash256, VerificationError};

use crate::entry::MerkleTreeLeaf;
use crate::merkle::leaf_hash;

/// Root hash of a log at a given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTreeHead {
    /// Number of entries committed to by `root_hash`.
    pub tree_size: u64,
    /// Merkle tree hash over entries `0..tree_size`.
    #[serde(rename = "tree_hash")]
    pub root_hash: Hash256,
}

impl LogTreeHead {
    pub fn new(tree_size: u64, root_hash: Hash256) -> Self {
        Self {
            tree_size,
            root_hash,
        }
    }

    /// Pick the head to keep as the latest verified one.
    ///
    /// `prev` is kept unless `candidate` is strictly larger. The caller must
    /// have verified consistency between the two before adopting the result.
    pub fn newer_of<'a>(
        prev: Option<&'a LogTreeHead>,
        candidate: &'a LogTreeHead,
    ) -> &'a LogTreeHead {
        match prev {
            Some(p) if p.tree_size >= candidate.tree_size => p,
            _ => candidate,
        }
    }
}

/// Root hash of a sparse Merkle map, bound to the mutation log head that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTreeHead {
    /// Root of the sparse Merkle tree.
    #[serde(rename = "map_hash")]
    pub root_hash: Hash256,
    /// Head of the mutation log whose entries produced this root.
    #[serde(rename = "mutation_log")]
    pub mutation_log_head: LogTreeHead,
}

impl MapTreeHead {
    pub fn new(root_hash: Hash256, mutation_log_head: LogTreeHead) -> Self {
        Self {
            root_hash,
            mutation_log_head,
        }
    }

    /// Number of mutations applied to produce this map state.
    pub fn tree_size(&self) -> u64 {
        self.mutation_log_head.tree_size
    }

    /// The canonical value recorded in the tree-head log for this head.
    ///
    /// Hashes travel as standard base64 strings and the size as a number,
    /// matching the JSON the service appends to its tree-head log.
    pub fn to_canonical_value(&self) -> CanonicalValue {
        let mut mutation_log = BTreeMap::new();
        mutation_log.insert(
            "tree_size".to_string(),
            CanonicalValue::Number(self.tree_size() as f64),
        );
        mutation_log.insert(
            "tree_hash".to_string(),
            CanonicalValue::String(self.mutation_log_head.root_hash.to_base64()),
        );

        let mut head = BTreeMap::new();
        head.insert(
            "map_hash".to_string(),
            CanonicalValue::String(self.root_hash.to_base64()),
        );
        head.insert("mutation_log".to_string(), CanonicalValue::Dict(mutation_log));
        CanonicalValue::Dict(head)
    }
}

impl MerkleTreeLeaf for MapTreeHead {
    fn leaf_hash(&self) -> Result<Hash256, VerificationError> {
        let digest = object_hash(&self.to_canonical_value())?;
        Ok(leaf_hash(digest.as_bytes()))
    }
}

/// A map head together with the tree-head log head it was proven included
/// in. This is the unit of trust a map client carries between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTreeState {
    pub map_head: MapTreeHead,
    pub tree_head_log_head: LogTreeHead,
}

impl MapTreeState {
    /// Size of the map (mutation log size).
    pub fn tree_size(&self) -> u64 {
        self.map_head.tree_size()
    }
}
