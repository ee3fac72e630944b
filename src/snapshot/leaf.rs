//! [`AtlasLeaf`] canonical encoding (§3):
//!
//! ```text
//! H_single( tag || boundary_type_ordinal || jurisdiction_fips || geoid || version_epoch )
//! ```
//!
//! `H_single` is [`crate::hash::hash_single`]; `tag` is a fixed domain
//! separator so a leaf hash can never collide with any other Poseidon
//! commitment computed elsewhere in the system (e.g. a nullifier).

use crate::hash::{hash_single, FieldElement};
use crate::types::{Boundary, BoundaryType};

/// Domain separator for Atlas leaves, distinct from any other Poseidon
/// commitment domain in the system. Chosen as a fixed ASCII tag rather than
/// a magic number so the encoding is legible in test vectors.
pub const LEAF_DOMAIN_TAG: u64 = 0x4c_45_41_46_5f_53_41; // "LEAF_SA"

/// The fields an [`crate::types::Boundary`] contributes to its leaf
/// encoding (§3).
#[derive(Debug, Clone)]
pub struct LeafInput {
    /// Boundary kind ordinal (precision rank, finest = 0).
    pub boundary_type_ordinal: u8,
    /// Jurisdiction FIPS code.
    pub jurisdiction_fips: String,
    /// Stable GEOID-derived id.
    pub geoid: String,
    /// Snapshot version epoch this leaf was built under.
    pub version_epoch: u64,
}

impl LeafInput {
    /// Extract the leaf input fields from a validated boundary.
    pub fn from_boundary(boundary: &Boundary, version_epoch: u64) -> Self {
        Self {
            boundary_type_ordinal: boundary.r#type.ordinal(),
            jurisdiction_fips: boundary.jurisdiction_fips.clone(),
            geoid: boundary.id.clone(),
            version_epoch,
        }
    }

    /// The canonical sort key: `(boundary_type_ordinal, jurisdiction_fips,
    /// geoid)` ascending (§3).
    pub fn sort_key(&self) -> (u8, &str, &str) {
        (self.boundary_type_ordinal, self.jurisdiction_fips.as_str(), self.geoid.as_str())
    }
}

/// Pack a [`LeafInput`] into a single 32-byte field element, reducing
/// modulo the BN254 scalar field order (§4.1 `hash_single`/`hash_pair`
/// operate on field elements, never raw bytes).
fn pack_preimage(input: &LeafInput) -> FieldElement {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&LEAF_DOMAIN_TAG.to_le_bytes());
    bytes.push(input.boundary_type_ordinal);
    bytes.extend_from_slice(input.jurisdiction_fips.as_bytes());
    bytes.extend_from_slice(input.geoid.as_bytes());
    bytes.extend_from_slice(&input.version_epoch.to_le_bytes());

    // Poseidon operates on a single field element; a SHA-256 pre-image
    // compression keeps this encoding a fixed 32 bytes regardless of how
    // long the FIPS/GEOID strings are, while staying entirely within the
    // native/WASM boundary (no additional cryptographic assumption beyond
    // what `hash_single` already makes over its own input).
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(&bytes);
    let mut le = [0u8; 32];
    le.copy_from_slice(&digest);
    FieldElement::from_le_bytes(le)
}

/// Encode one boundary into its Atlas leaf (§3, §4.12 step 1).
pub fn encode_leaf(input: &LeafInput) -> Result<FieldElement, crate::errors::ShadowAtlasError> {
    hash_single(pack_preimage(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(geoid: &str, epoch: u64) -> LeafInput {
        LeafInput {
            boundary_type_ordinal: 1,
            jurisdiction_fips: "1500300".to_string(),
            geoid: geoid.to_string(),
            version_epoch: epoch,
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_leaf(&input("15003", 1)).unwrap();
        let b = encode_leaf(&input("15003", 1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_geoid_yields_different_leaf() {
        let a = encode_leaf(&input("15003", 1)).unwrap();
        let b = encode_leaf(&input("15004", 1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_version_epoch_yields_different_leaf() {
        let a = encode_leaf(&input("15003", 1)).unwrap();
        let b = encode_leaf(&input("15003", 2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn sort_key_orders_by_type_then_fips_then_geoid() {
        let a = input("15003", 1);
        let mut b = input("15004", 1);
        b.boundary_type_ordinal = 0;
        assert!(b.sort_key() < a.sort_key());
    }
}
