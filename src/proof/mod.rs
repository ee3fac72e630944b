//! C13: Atlas serving and the client-side proof engine.
//!
//! `lookup` ties the resolver (C5) to a published snapshot (C12) to produce
//! a [`MerkleProof`]; `verify_proof` folds that proof bottom-up and checks
//! it against a declared root; `proof_for_action` binds the three public
//! inputs the Halo2 circuit consumes (treated as an oracle per §1 — this
//! module only assembles and validates its calldata-facing inputs, never
//! the constraint system itself).

pub mod action;
pub mod lookup;

pub use action::{ActionBinding, Halo2Prover, ProverError};
pub use lookup::{lookup, lookup_point, LookupError, LookupResult};

use serde::{Deserialize, Serialize};

use crate::errors::ShadowAtlasError;
use crate::hash::{hash_pair, FieldElement};

/// A Merkle inclusion proof for one leaf (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf being proven, big-endian hex.
    pub leaf: [u8; 32],
    /// Sibling hashes bottom-up.
    pub siblings: Vec<[u8; 32]>,
    /// `0` = sibling is on the left (this node is the right child), `1` =
    /// sibling is on the right (§3).
    pub path_indices: Vec<u8>,
    /// The root this proof is claimed to fold up to.
    pub declared_root: [u8; 32],
}

/// Walk `proof.siblings` bottom-up using `hash_pair`, applying
/// `path_indices[i]` to decide left/right order, and compare the folded
/// result against `proof.declared_root` (§4.13, testable properties #5/#6).
pub fn verify_proof(proof: &MerkleProof) -> Result<bool, ShadowAtlasError> {
    if proof.siblings.len() != proof.path_indices.len() {
        return Ok(false);
    }
    let mut acc = FieldElement(proof.leaf);
    for (sibling, bit) in proof.siblings.iter().zip(proof.path_indices.iter()) {
        let sibling = FieldElement(*sibling);
        acc = match bit {
            0 => hash_pair(sibling, acc)?,
            _ => hash_pair(acc, sibling)?,
        };
    }
    Ok(acc.0 == proof.declared_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fold_tree;

    fn leaf(byte: u8) -> [u8; 32] {
        let mut b = [0u8; 32];
        b[0] = byte;
        b
    }

    fn proof_for(leaves: &[[u8; 32]], index: usize) -> MerkleProof {
        let tree = fold_tree(leaves).unwrap();
        let (siblings, path_indices) = tree.proof_path(index).unwrap();
        MerkleProof {
            leaf: leaves[index],
            siblings,
            path_indices,
            declared_root: tree.root(),
        }
    }

    #[test]
    fn valid_proof_verifies() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4)];
        for i in 0..leaves.len() {
            assert!(verify_proof(&proof_for(&leaves, i)).unwrap());
        }
    }

    #[test]
    fn tampered_sibling_fails_verification() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4)];
        let mut proof = proof_for(&leaves, 0);
        proof.siblings[0][0] ^= 0xff;
        assert!(!verify_proof(&proof).unwrap());
    }

    #[test]
    fn tampered_path_bit_fails_verification() {
        let leaves = vec![leaf(1), leaf(2), leaf(3), leaf(4)];
        let mut proof = proof_for(&leaves, 0);
        proof.path_indices[0] ^= 1;
        assert!(!verify_proof(&proof).unwrap());
    }

    #[test]
    fn mismatched_lengths_is_rejected_not_panicking() {
        let leaves = vec![leaf(1), leaf(2)];
        let mut proof = proof_for(&leaves, 0);
        proof.path_indices.pop();
        assert!(!verify_proof(&proof).unwrap());
    }
}
