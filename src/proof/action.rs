//! `proof_for_action`: binds the three public inputs the browser prover
//! feeds into a Halo2 proof (§4.13). The circuit itself is out of scope
//! (§1) — this module only assembles and type-checks its public-input
//! tuple, delegating the actual proof generation to a [`Halo2Prover`]
//! implementor that the client wires up.

use serde::{Deserialize, Serialize};

use crate::hash::FieldElement;
use crate::types::Nullifier;

use super::MerkleProof;

/// The three public inputs a membership proof binds together (§3
/// "Membership proof", §4.13): the user's identity commitment, the action
/// being authorized, and the district root the Merkle proof folds to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionBinding {
    /// The user's identity commitment (never the raw identity).
    pub identity_commitment: [u8; 32],
    /// The action being authorized (e.g. a petition/vote id).
    pub action_id: [u8; 32],
    /// The district root the accompanying Merkle proof claims inclusion
    /// against.
    pub district_root: [u8; 32],
    /// The Merkle inclusion proof itself.
    pub merkle_proof: MerkleProof,
}

impl ActionBinding {
    /// The nullifier the circuit is expected to derive from
    /// `(identity_commitment, action_id)` (§3). The circuit is the oracle
    /// of record for the actual derivation (§1); this helper exists only so
    /// native/server code can predict a nullifier for de-duplication
    /// bookkeeping ahead of receiving a proof back from the client.
    pub fn expected_nullifier(&self, derive: impl Fn(FieldElement, FieldElement) -> Nullifier) -> Nullifier {
        derive(FieldElement(self.identity_commitment), FieldElement(self.action_id))
    }
}

/// Failure generating a proof client-side.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProverError {
    /// The bound Merkle proof doesn't even fold locally; no point asking
    /// the circuit to prove a false statement.
    #[error("merkle proof does not fold to its declared root")]
    InvalidMerklePath,
    /// The underlying Halo2 prover failed (timeout, OOM, malformed witness).
    #[error("prover failed: {0}")]
    ProverFailed(String),
}

/// The browser prover surface (§4.13): binds `(identity_commitment,
/// action_id, district_root)` into a proof using the circuit's pinned
/// constants. Implemented outside this crate (the constraint system is an
/// oracle, §1); this trait is the seam the client wires a real Halo2
/// prover into.
pub trait Halo2Prover {
    /// Opaque serialized proof bytes, following the circuit's canonical
    /// calldata encoding (§4.14).
    fn prove(&self, binding: &ActionBinding) -> Result<Vec<u8>, ProverError>;
}

/// Validate a binding's Merkle proof before handing it to a prover (cheap
/// client-side check so a malformed witness never reaches the expensive
/// 4-12s proof-generation step, §4.13 performance targets).
pub fn validate_binding(binding: &ActionBinding) -> Result<(), ProverError> {
    let folds = super::verify_proof(&binding.merkle_proof).map_err(|e| ProverError::ProverFailed(e.to_string()))?;
    if folds && binding.merkle_proof.declared_root == binding.district_root {
        Ok(())
    } else {
        Err(ProverError::InvalidMerklePath)
    }
}
