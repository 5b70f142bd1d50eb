//! Reference Merkle tree for tests, written directly from the recursive
//! definitions (MTH, PATH, SUBPROOF) rather than the iterative walks the
//! verifiers use.

use vds_core::Hash256;

use crate::merkle::{calc_k, leaf_hash, node_hash};

/// Leaf hashes of `n` synthetic entries `"entry-0"`, `"entry-1"`, ...
pub(crate) fn leaves(n: u64) -> Vec<Hash256> {
    (0..n)
        .map(|i| leaf_hash(format!("entry-{i}").as_bytes()))
        .collect()
}

/// Merkle tree hash over a non-empty slice of leaf hashes.
pub(crate) fn root(leaves: &[Hash256]) -> Hash256 {
    match leaves.len() {
        0 => Hash256::sha256(&[]),
        1 => leaves[0],
        n => {
            let k = calc_k(n as u64) as usize;
            node_hash(&root(&leaves[..k]), &root(&leaves[k..]))
        }
    }
}

/// Audit path for leaf `m`, nearest sibling first.
pub(crate) fn inclusion_path(m: usize, leaves: &[Hash256]) -> Vec<Hash256> {
    let n = leaves.len();
    if n <= 1 {
        return Vec::new();
    }
    let k = calc_k(n as u64) as usize;
    let (mut path, sibling) = if m < k {
        (inclusion_path(m, &leaves[..k]), root(&leaves[k..]))
    } else {
        (inclusion_path(m - k, &leaves[k..]), root(&leaves[..k]))
    };
    path.push(sibling);
    path
}

/// Consistency proof between the first `m` leaves and all of `leaves`.
pub(crate) fn consistency_path(m: usize, leaves: &[Hash256]) -> Vec<Hash256> {
    subproof(m, leaves, true)
}

fn subproof(m: usize, leaves: &[Hash256], complete: bool) -> Vec<Hash256> {
    let n = leaves.len();
    if m == n {
        return if complete { Vec::new() } else { vec![root(leaves)] };
    }
    let k = calc_k(n as u64) as usize;
    let (mut path, sibling) = if m <= k {
        (subproof(m, &leaves[..k], complete), root(&leaves[k..]))
    } else {
        (subproof(m - k, &leaves[k..], false), root(&leaves[..k]))
    };
    path.push(sibling);
    path
}
