//! # Log Proofs
//!
//! Verification of inclusion and consistency proofs for an append-only
//! Merkle tree log whose leaves are numbered `0..tree_size`, left to right.
//!
//! ## Algorithm
//!
//! Both verifiers walk the audit path bottom-up with a binary counter pair:
//! `fn` tracks the node being proven and `sn` the last node of the tree.
//! When `fn` is a right child (odd) or the rightmost node at its level
//! (`fn == sn`), the path element is its left sibling; otherwise it is the
//! right sibling. Levels where the rightmost node has no sibling are
//! skipped by shifting both counters until `fn` is odd or zero. A proof is
//! only accepted if it consumes exactly the levels of the tree (`sn`
//! reaches zero) and reproduces the expected root.
//!
//! A consistency proof omits the first root when the first size is a power
//! of two, since that root is then a complete subtree of the second tree.

use serde::{Deserialize, Serialize};
use vds_core::{Hash256, VerificationError};

use crate::entry::MerkleTreeLeaf;
use crate::head::LogTreeHead;
use crate::merkle::{is_power_of_two, node_hash};

/// Proof that a leaf is included in a log of a given size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInclusionProof {
    /// Size of the tree the proof was issued for.
    pub tree_size: u64,
    /// Leaf hash of the entry being proven.
    pub leaf_hash: Hash256,
    /// Zero-based position of the entry in the log.
    pub leaf_index: u64,
    /// Sibling hashes, nearest the leaf first.
    pub audit_path: Vec<Hash256>,
}

impl LogInclusionProof {
    /// Assemble a proof from the service's response. Nothing is checked
    /// until [`verify`](Self::verify).
    pub fn new(
        tree_size: u64,
        leaf_hash: Hash256,
        leaf_index: u64,
        audit_path: Vec<Hash256>,
    ) -> Self {
        Self {
            tree_size,
            leaf_hash,
            leaf_index,
            audit_path,
        }
    }

    /// Verify that this proof reproduces `head.root_hash`.
    ///
    /// # Errors
    ///
    /// - `ProofRange` if `leaf_index >= head.tree_size`.
    /// - `VerificationFailed` if the proof was issued for another tree
    ///   size, has the wrong length, or the computed root differs.
    pub fn verify(&self, head: &LogTreeHead) -> Result<(), VerificationError> {
        if self.leaf_index >= head.tree_size {
            return Err(VerificationError::ProofRange(format!(
                "leaf index {} outside tree of size {}",
                self.leaf_index, head.tree_size
            )));
        }
        if self.tree_size != head.tree_size {
            return Err(failed(format!(
                "inclusion proof is for tree size {}, head has size {}",
                self.tree_size, head.tree_size
            )));
        }

        let mut fn_ = self.leaf_index;
        let mut sn = self.tree_size - 1;
        let mut running = self.leaf_hash;

        for p in &self.audit_path {
            if fn_ == sn || fn_ & 1 == 1 {
                running = node_hash(p, &running);
                while fn_ != 0 && fn_ & 1 == 0 {
                    fn_ >>= 1;
                    sn >>= 1;
                }
            } else {
                running = node_hash(&running, p);
            }
            fn_ >>= 1;
            sn >>= 1;
        }

        if sn != 0 {
            return Err(failed(format!(
                "inclusion path of length {} does not span a tree of size {}",
                self.audit_path.len(),
                self.tree_size
            )));
        }
        if running != head.root_hash {
            tracing::warn!(
                tree_size = head.tree_size,
                leaf_index = self.leaf_index,
                "inclusion proof root mismatch"
            );
            return Err(failed(format!(
                "inclusion proof for leaf {} does not reproduce root of tree size {}",
                self.leaf_index, head.tree_size
            )));
        }
        tracing::debug!(
            tree_size = head.tree_size,
            leaf_index = self.leaf_index,
            "inclusion proof verified"
        );
        Ok(())
    }

    /// Verify the proof and that it was issued for `leaf`.
    pub fn verify_leaf(
        &self,
        head: &LogTreeHead,
        leaf: &impl MerkleTreeLeaf,
    ) -> Result<(), VerificationError> {
        if leaf.leaf_hash()? != self.leaf_hash {
            return Err(failed(format!(
                "inclusion proof for leaf {} was issued for a different entry",
                self.leaf_index
            )));
        }
        self.verify(head)
    }
}

/// Proof that a log of `second_size` is an append-only extension of the
/// same log at `first_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConsistencyProof {
    /// Size of the older tree.
    pub first_size: u64,
    /// Size of the newer tree.
    pub second_size: u64,
    /// Proof nodes as returned by the service, without the first root when
    /// `first_size` is a power of two.
    pub audit_path: Vec<Hash256>,
}

impl LogConsistencyProof {
    /// Assemble a proof from the service's response.
    pub fn new(first_size: u64, second_size: u64, audit_path: Vec<Hash256>) -> Self {
        Self {
            first_size,
            second_size,
            audit_path,
        }
    }

    /// Verify that this proof reproduces both `first.root_hash` and
    /// `second.root_hash`.
    ///
    /// # Errors
    ///
    /// - `VerificationFailed` if the heads do not have the proof's sizes,
    ///   the path is empty or of the wrong length, or either computed root
    ///   differs.
    /// - `ProofRange` unless `1 <= first.tree_size < second.tree_size`.
    pub fn verify(
        &self,
        first: &LogTreeHead,
        second: &LogTreeHead,
    ) -> Result<(), VerificationError> {
        if first.tree_size != self.first_size {
            return Err(failed(format!(
                "consistency proof starts at size {}, head has size {}",
                self.first_size, first.tree_size
            )));
        }
        if second.tree_size != self.second_size {
            return Err(failed(format!(
                "consistency proof ends at size {}, head has size {}",
                self.second_size, second.tree_size
            )));
        }
        if first.tree_size < 1 || first.tree_size >= second.tree_size {
            return Err(VerificationError::ProofRange(format!(
                "consistency requires 1 <= first < second, got {} and {}",
                first.tree_size, second.tree_size
            )));
        }

        let mut proof = Vec::with_capacity(self.audit_path.len() + 1);
        if is_power_of_two(first.tree_size) {
            proof.push(first.root_hash);
        }
        proof.extend_from_slice(&self.audit_path);

        let Some((seed, rest)) = proof.split_first() else {
            return Err(failed("empty consistency proof".to_string()));
        };

        let mut fn_ = first.tree_size - 1;
        let mut sn = second.tree_size - 1;
        while fn_ & 1 == 1 {
            fn_ >>= 1;
            sn >>= 1;
        }

        let mut fr = *seed;
        let mut sr = *seed;
        for p in rest {
            if sn == 0 {
                return Err(failed(format!(
                    "consistency proof longer than the {} -> {} range allows",
                    first.tree_size, second.tree_size
                )));
            }
            if fn_ & 1 == 1 || fn_ == sn {
                fr = node_hash(p, &fr);
                sr = node_hash(p, &sr);
                while fn_ != 0 && fn_ & 1 == 0 {
                    fn_ >>= 1;
                    sn >>= 1;
                }
            } else {
                sr = node_hash(&sr, p);
            }
            fn_ >>= 1;
            sn >>= 1;
        }

        if sn != 0 {
            return Err(failed(format!(
                "consistency proof too short for the {} -> {} range",
                first.tree_size, second.tree_size
            )));
        }
        if fr != first.root_hash || sr != second.root_hash {
            tracing::warn!(
                first_size = first.tree_size,
                second_size = second.tree_size,
                first_matches = fr == first.root_hash,
                second_matches = sr == second.root_hash,
                "consistency proof root mismatch"
            );
            return Err(failed(format!(
                "consistency proof does not reproduce roots for sizes {} and {}",
                first.tree_size, second.tree_size
            )));
        }
        tracing::debug!(
            first_size = first.tree_size,
            second_size = second.tree_size,
            "consistency proof verified"
        );
        Ok(())
    }
}

/// Verify that two heads of the same log are consistent, in either order.
///
/// Heads of equal size must have equal roots and need no proof. Otherwise
/// `proof` must cover the smaller size to the larger one.
///
/// # Errors
///
/// - `ProofRange` if either head has size zero.
/// - `VerificationFailed` if equal-size roots differ, the proof is missing,
///   or it does not verify.
pub fn verify_consistency_between(
    a: &LogTreeHead,
    b: &LogTreeHead,
    proof: Option<&LogConsistencyProof>,
) -> Result<(), VerificationError> {
    if a.tree_size == 0 || b.tree_size == 0 {
        return Err(VerificationError::ProofRange(format!(
            "consistency needs non-empty heads, got sizes {} and {}",
            a.tree_size, b.tree_size
        )));
    }
    if a.tree_size == b.tree_size {
        if a.root_hash != b.root_hash {
            return Err(failed(format!(
                "two heads of size {} have different roots",
                a.tree_size
            )));
        }
        return Ok(());
    }

    let (first, second) = if a.tree_size < b.tree_size { (a, b) } else { (b, a) };
    let proof = proof.ok_or_else(|| {
        failed(format!(
            "no consistency proof supplied for sizes {} and {}",
            first.tree_size, second.tree_size
        ))
    })?;
    proof.verify(first, second)
}

fn failed(msg: String) -> VerificationError {
    VerificationError::VerificationFailed(msg)
}
