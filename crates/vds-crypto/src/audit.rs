//! # Full Log Audit
//!
//! An inclusion proof shows that *some* entry is in the log. An audit shows
//! that the head's root is the Merkle tree hash over *every* entry up to
//! its size, so a service cannot hide entries from an auditor while still
//! handing out consistent heads.
//!
//! ## Algorithm
//!
//! The auditor keeps a stack holding the roots of the complete subtrees
//! that make up the prefix processed so far, largest at the bottom. This
//! is the binary decomposition of the prefix size:
//!
//! ```text
//! prefix of 6 leaves:   [ root(0..4), root(4..6) ]
//! push leaf 6:          [ root(0..4), root(4..6), leaf6 ]
//! push leaf 7, merge:   [ root(0..8) ]
//! ```
//!
//! Pushing leaf `i` merges the top two entries once per trailing one bit
//! of `i`. At the end the stack is folded right-to-left into the root.
//!
//! Resuming from a trusted head of size `s` needs the complete subtree
//! roots of that prefix. They are exactly the audit path of leaf `s` in the
//! tree of size `s + 1`, which the caller fetches and hands over as an
//! [`AuditCheckpoint`]. Folding that path must reproduce the trusted root.

use vds_core::{Hash256, VerificationError};

use crate::entry::MerkleTreeLeaf;
use crate::head::LogTreeHead;
use crate::log::LogInclusionProof;
use crate::merkle::node_hash;

/// Inspects each entry's content as it is audited.
///
/// Returning an error aborts the audit with that error.
pub trait LogAuditor<E> {
    fn audit_log_entry(&mut self, index: u64, entry: &E) -> Result<(), VerificationError>;
}

impl<E, F> LogAuditor<E> for F
where
    F: FnMut(u64, &E) -> Result<(), VerificationError>,
{
    fn audit_log_entry(&mut self, index: u64, entry: &E) -> Result<(), VerificationError> {
        self(index, entry)
    }
}

/// An auditor that accepts every entry; only the tree structure is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<E> LogAuditor<E> for AcceptAll {
    fn audit_log_entry(&mut self, _index: u64, _entry: &E) -> Result<(), VerificationError> {
        Ok(())
    }
}

/// A previously audited head and the path needed to resume after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditCheckpoint {
    head: LogTreeHead,
    resume_path: Vec<Hash256>,
}

impl AuditCheckpoint {
    /// Build a checkpoint from a trusted head and the inclusion proof by
    /// index for leaf `head.tree_size` at tree size `head.tree_size + 1`.
    ///
    /// The proof's leaf hash is not used: only the siblings matter, and
    /// they are checked against `head.root_hash` when the audit runs.
    ///
    /// # Errors
    ///
    /// `ProofRange` if the proof is for any other index or size.
    pub fn new(
        head: LogTreeHead,
        resume_proof: LogInclusionProof,
    ) -> Result<Self, VerificationError> {
        let expected_size = head.tree_size.checked_add(1).ok_or_else(|| {
            VerificationError::ProofRange("checkpoint tree size overflows".to_string())
        })?;
        if resume_proof.leaf_index != head.tree_size || resume_proof.tree_size != expected_size {
            return Err(VerificationError::ProofRange(format!(
                "resume proof must be for index {} at size {}, got index {} at size {}",
                head.tree_size, expected_size, resume_proof.leaf_index, resume_proof.tree_size
            )));
        }
        Ok(Self {
            head,
            resume_path: resume_proof.audit_path,
        })
    }

    pub fn head(&self) -> &LogTreeHead {
        &self.head
    }

    /// Fold the resume path into the stack of subtree roots for the prefix,
    /// largest subtree at the bottom.
    fn seed_stack(&self) -> Result<Vec<Hash256>, VerificationError> {
        if self.head.tree_size == 0 {
            return Ok(Vec::new());
        }
        // One sibling per complete subtree of the prefix.
        let expected_len = self.head.tree_size.count_ones() as usize;
        if self.resume_path.len() != expected_len {
            return Err(VerificationError::VerificationFailed(format!(
                "resume path has {} nodes, a prefix of size {} needs {}",
                self.resume_path.len(),
                self.head.tree_size,
                expected_len
            )));
        }
        let Some((first, rest)) = self.resume_path.split_first() else {
            return Err(VerificationError::VerificationFailed(format!(
                "empty resume path for checkpoint at size {}",
                self.head.tree_size
            )));
        };
        let folded = rest.iter().fold(*first, |acc, p| node_hash(p, &acc));
        if folded != self.head.root_hash {
            tracing::warn!(
                tree_size = self.head.tree_size,
                "resume path does not reproduce checkpoint root"
            );
            return Err(VerificationError::VerificationFailed(format!(
                "resume path does not reproduce the root at size {}",
                self.head.tree_size
            )));
        }
        Ok(self.resume_path.iter().rev().copied().collect())
    }
}

/// Audit every entry from `prev` (or from the start) up to `head`.
///
/// `entries` must yield the entries at indices `prev.tree_size ..
/// head.tree_size` in order; it is consumed once. Each entry is passed to
/// `auditor` before it is folded into the tree.
///
/// # Errors
///
/// - `ProofRange` if `prev` is larger than `head`.
/// - `VerificationFailed` if the resume path or the final root does not
///   match.
/// - `IncompleteAuditRange` if `entries` yields too few or too many items.
///   Extra items are reported as `expected + 1` received, without draining
///   the iterator.
/// - Any error from computing a leaf hash or from `auditor`.
pub fn audit_entries<E, I, A>(
    prev: Option<&AuditCheckpoint>,
    head: &LogTreeHead,
    entries: I,
    mut auditor: A,
) -> Result<(), VerificationError>
where
    E: MerkleTreeLeaf,
    I: IntoIterator<Item = E>,
    A: LogAuditor<E>,
{
    let start = prev.map_or(0, |p| p.head.tree_size);
    if start > head.tree_size {
        return Err(VerificationError::ProofRange(format!(
            "cannot audit backwards from size {start} to size {}",
            head.tree_size
        )));
    }

    let mut stack = match prev {
        Some(checkpoint) => checkpoint.seed_stack()?,
        None => Vec::new(),
    };

    let expected = head.tree_size - start;
    let mut entries = entries.into_iter();
    let mut idx = start;
    while idx < head.tree_size {
        let Some(entry) = entries.next() else {
            break;
        };
        auditor.audit_log_entry(idx, &entry)?;
        stack.push(entry.leaf_hash()?);

        let mut z = idx;
        while z & 1 == 1 {
            let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                return Err(VerificationError::VerificationFailed(
                    "subtree stack underflow".to_string(),
                ));
            };
            stack.push(node_hash(&left, &right));
            z >>= 1;
        }
        idx += 1;
    }

    // Counting stops one past the head; the rest of the stream is not read.
    let mut received = idx - start;
    if received == expected && entries.next().is_some() {
        received += 1;
    }
    if received != expected {
        tracing::warn!(expected, received, "audit entry range incomplete");
        return Err(VerificationError::IncompleteAuditRange { expected, received });
    }

    let computed = match stack.pop() {
        Some(top) => stack.iter().rev().fold(top, |acc, left| node_hash(left, &acc)),
        // Only reachable for an empty log.
        None => Hash256::sha256(&[]),
    };
    if computed != head.root_hash {
        tracing::warn!(tree_size = head.tree_size, "audited root mismatch");
        return Err(VerificationError::VerificationFailed(format!(
            "entries 0..{} do not hash to the head root",
            head.tree_size
        )));
    }
    tracing::debug!(from = start, to = head.tree_size, "log audit complete");
    Ok(())
}
