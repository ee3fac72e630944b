//! C14: the on-chain gate contract, specified at its interface (§1 — the
//! contract itself lives outside this repo's collaborators). This module
//! defines the ABI as a Rust trait plus an in-memory reference
//! implementation used by the rest of the crate's tests and by the service
//! layer's local/dev mode; a production deployment swaps in a real chain
//! client behind the same trait.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ShadowAtlasError;
use crate::types::Nullifier;

/// Default grace window a superseded root remains valid for (§4.14, §8
/// scenario 6).
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 7;

/// Emitted on every successful `verify_and_consume` call (§4.14, §6). Never
/// records the nullifier's pre-image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verified {
    /// The district root the proof was anchored to.
    pub district_root: [u8; 32],
    /// The action this proof authorized.
    pub action_id: [u8; 32],
    /// Block (or wall-clock, for the reference implementation) time.
    pub block_time: DateTime<Utc>,
}

/// The on-chain gate's ABI (§6):
/// `verify_and_consume`, `update_root`, `current_root`, `is_valid_root`.
pub trait DistrictGate {
    /// Accept `district_root` if it's current or still within its grace
    /// window, reject a replayed `nullifier`, call the verifier, and emit
    /// [`Verified`] on success. Never reverts partial state (§7).
    fn verify_and_consume(
        &mut self,
        district_root: [u8; 32],
        nullifier: Nullifier,
        action_id: [u8; 32],
        proof_bytes: &[u8],
    ) -> Result<bool, ShadowAtlasError>;

    /// Privileged: move the current root into `historical_roots` for the
    /// grace window, then adopt `new_root` as current (§4.14).
    fn update_root(&mut self, new_root: [u8; 32], now: DateTime<Utc>);

    /// The currently registered root.
    fn current_root(&self) -> [u8; 32];

    /// Whether `root` is the current root or still within its grace window.
    fn is_valid_root(&self, root: [u8; 32], now: DateTime<Utc>) -> bool;
}

/// A verifier oracle: the Halo2 circuit's calldata contract (§4.14), out of
/// scope for this crate (§1). Returns `true` on the verifier's canonical
/// 32-byte success value, `false` otherwise; never panics on malformed
/// `proof_bytes`.
pub trait ProofVerifier {
    /// Verify `proof_bytes` against the circuit's pinned constants.
    fn verify(&self, proof_bytes: &[u8]) -> bool;
}

struct HistoricalRoot {
    root: [u8; 32],
    valid_until: DateTime<Utc>,
}

/// In-memory reference implementation of [`DistrictGate`] (§4.14, §5
/// "`used_nullifiers` is strictly monotonic"). Intended for tests and local
/// development; a production deployment anchors this state on-chain
/// instead.
pub struct InMemoryDistrictGate<V: ProofVerifier> {
    current_root: [u8; 32],
    historical_roots: Vec<HistoricalRoot>,
    used_nullifiers: BTreeSet<Nullifier>,
    grace_period: Duration,
    verifier: V,
    events: Vec<Verified>,
}

impl<V: ProofVerifier> InMemoryDistrictGate<V> {
    /// A gate rooted at `genesis_root`, verifying proofs with `verifier`.
    pub fn new(genesis_root: [u8; 32], verifier: V) -> Self {
        Self {
            current_root: genesis_root,
            historical_roots: Vec::new(),
            used_nullifiers: BTreeSet::new(),
            grace_period: Duration::days(DEFAULT_GRACE_PERIOD_DAYS),
            verifier,
            events: Vec::new(),
        }
    }

    /// Override the default grace window.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Emitted [`Verified`] events, for test assertions and the service
    /// layer's activity feed.
    pub fn events(&self) -> &[Verified] {
        &self.events
    }

    /// Whether `nullifier` has already been consumed.
    pub fn is_nullifier_used(&self, nullifier: Nullifier) -> bool {
        self.used_nullifiers.contains(&nullifier)
    }
}

impl<V: ProofVerifier> DistrictGate for InMemoryDistrictGate<V> {
    fn verify_and_consume(
        &mut self,
        district_root: [u8; 32],
        nullifier: Nullifier,
        action_id: [u8; 32],
        proof_bytes: &[u8],
    ) -> Result<bool, ShadowAtlasError> {
        let now = Utc::now();
        if !self.is_valid_root(district_root, now) {
            return Err(ShadowAtlasError::ProofVerificationFailure);
        }
        if self.used_nullifiers.contains(&nullifier) {
            return Err(ShadowAtlasError::NullifierReplay);
        }
        if !self.verifier.verify(proof_bytes) {
            return Err(ShadowAtlasError::ProofVerificationFailure);
        }
        self.used_nullifiers.insert(nullifier);
        self.events.push(Verified {
            district_root,
            action_id,
            block_time: now,
        });
        Ok(true)
    }

    fn update_root(&mut self, new_root: [u8; 32], now: DateTime<Utc>) {
        self.historical_roots.push(HistoricalRoot {
            root: self.current_root,
            valid_until: now + self.grace_period,
        });
        self.current_root = new_root;
    }

    fn current_root(&self) -> [u8; 32] {
        self.current_root
    }

    fn is_valid_root(&self, root: [u8; 32], now: DateTime<Utc>) -> bool {
        if root == self.current_root {
            return true;
        }
        self.historical_roots
            .iter()
            .any(|h| h.root == root && now < h.valid_until)
    }
}
