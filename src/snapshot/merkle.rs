//! Bottom-up Poseidon Merkle tree construction (§4.12 steps 2-4).
//!
//! Odd levels are padded by hashing the last node with a pinned zero-leaf
//! constant; that constant is itself part of the integrity manifest, so a
//! build can never silently drift by changing how padding works.

use crate::errors::ShadowAtlasError;
use crate::hash::{field_from_hex_be, field_to_hex_be, hash_pair, FieldElement};

/// The pinned zero-leaf padding constant (§4.12), a fixed field element
/// distinct from any real leaf encoding's output range in practice (the
/// padding rule tolerates a collision in principle, since a padded node is
/// never a sibling claimed to be a real boundary; the value is pinned so
/// every build and every verifier pads identically).
pub const ZERO_LEAF_HEX: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

fn zero_leaf() -> FieldElement {
    field_from_hex_be(ZERO_LEAF_HEX).expect("pinned zero-leaf constant parses")
}

/// A full Merkle tree, leaves first, root last.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<FieldElement>>,
}

impl MerkleTree {
    /// The root (the sole element of the final level).
    pub fn root(&self) -> [u8; 32] {
        self.levels.last().expect("tree always has at least one level")[0].0
    }

    /// All levels, leaves first, as raw 32-byte arrays (for serialization
    /// in [`super::AtlasSnapshot`]).
    pub fn levels_bytes(&self) -> Vec<Vec<[u8; 32]>> {
        self.levels.iter().map(|lvl| lvl.iter().map(|fe| fe.0).collect()).collect()
    }

    /// Siblings and path indices for the leaf at `index` (C13 proof
    /// extraction): `path_indices[i]` is `0` if the leaf at level `i` is
    /// the left child, `1` if it's the right child (§3).
    pub fn proof_path(&self, mut index: usize) -> Option<(Vec<[u8; 32]>, Vec<u8>)> {
        if index >= self.levels[0].len() {
            return None;
        }
        let mut siblings = Vec::new();
        let mut path_indices = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = index % 2 == 1;
            let sibling_index = if is_right { index - 1 } else { index + 1 };
            let sibling = level.get(sibling_index).copied().unwrap_or_else(zero_leaf);
            siblings.push(sibling.0);
            path_indices.push(is_right as u8);
            index /= 2;
        }
        Some((siblings, path_indices))
    }
}

/// Build the Merkle tree over `sorted_leaves` (already in canonical order;
/// §4.12 step 2 is the caller's responsibility via
/// [`super::leaf::LeafInput::sort_key`]).
pub fn fold_tree(sorted_leaves: &[[u8; 32]]) -> Result<MerkleTree, ShadowAtlasError> {
    if sorted_leaves.is_empty() {
        // A tree with zero leaves still has a well-defined root: the
        // zero-leaf constant itself, so an empty Atlas is representable
        // without special-casing every consumer.
        return Ok(MerkleTree {
            levels: vec![vec![zero_leaf()]],
        });
    }

    let mut current: Vec<FieldElement> = sorted_leaves.iter().map(|b| FieldElement(*b)).collect();
    let mut levels = vec![current.clone()];

    while current.len() > 1 {
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        let mut i = 0;
        while i < current.len() {
            let left = current[i];
            let right = current.get(i + 1).copied().unwrap_or_else(zero_leaf);
            next.push(hash_pair(left, right)?);
            i += 2;
        }
        levels.push(next.clone());
        current = next;
    }

    Ok(MerkleTree { levels })
}
