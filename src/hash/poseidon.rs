//! Native Poseidon-over-BN254 evaluation (width 3, rate 2), matching the
//! circuit's `new_circom` parameterization so `hash_pair`/`hash_single`
//! produce byte-identical output to the production circuit for the same
//! inputs (§4.1).

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonError, PoseidonHasher};

use crate::errors::ShadowAtlasError;

/// A BN254 scalar field element, stored little-endian internally (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldElement(pub [u8; 32]);

impl FieldElement {
    /// Build from a little-endian byte array, reducing modulo the field
    /// order if the bytes represent a value outside `[0, p)`.
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        let fr = Fr::from_le_bytes_mod_order(&bytes);
        Self(to_le_array(fr))
    }

    /// Build from a small decimal value (test vectors, action ids).
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self::from_le_bytes(bytes)
    }

    fn to_fr(self) -> Fr {
        Fr::from_le_bytes_mod_order(&self.0)
    }

    fn from_fr(fr: Fr) -> Self {
        Self(to_le_array(fr))
    }
}

fn to_le_array(fr: Fr) -> [u8; 32] {
    let bytes = fr.into_bigint().to_bytes_le();
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

fn map_poseidon_err(e: PoseidonError) -> ShadowAtlasError {
    tracing::error!(error = %e, "POSEIDON_EVALUATION_FAILED");
    ShadowAtlasError::CryptographicIntegrityFailure
}

/// Hash two field elements (the Merkle-node case, C2/C11).
pub fn hash_pair(left: FieldElement, right: FieldElement) -> Result<FieldElement, ShadowAtlasError> {
    let mut hasher = Poseidon::<Fr>::new_circom(2).map_err(map_poseidon_err)?;
    let out = hasher
        .hash(&[left.to_fr(), right.to_fr()])
        .map_err(map_poseidon_err)?;
    Ok(FieldElement::from_fr(out))
}

/// Hash a single field element (the leaf-commitment case, C2).
pub fn hash_single(value: FieldElement) -> Result<FieldElement, ShadowAtlasError> {
    let mut hasher = Poseidon::<Fr>::new_circom(1).map_err(map_poseidon_err)?;
    let out = hasher.hash(&[value.to_fr()]).map_err(map_poseidon_err)?;
    Ok(FieldElement::from_fr(out))
}
