//! C1: the Poseidon-over-BN254 hash primitive.
//!
//! `hash_pair`/`hash_single` must produce byte-identical output to the
//! production Halo2 circuit (treated here as an oracle, per §1 out-of-scope)
//! in three execution environments: native (Atlas builder, server), WASM
//! (browser prover), and the circuit itself. This module is the native +
//! WASM half of that contract; the circuit half is out of scope.

pub mod constants;
pub mod encoding;
pub mod poseidon;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use constants::{
    verify_constant_table, verify_pinned_constant_table, PoseidonParams,
    PINNED_CONSTANT_TABLE_DIGEST_HEX,
};
pub use encoding::{field_from_hex_be, field_to_hex_be};
pub use poseidon::{hash_pair, hash_single, FieldElement};

/// Golden determinism vector pinned from outside this codebase (§4.1, §8.2):
/// `hash_pair(12345, 67890)` must equal this value in the native, WASM, and
/// circuit environments alike. Never regenerate this constant from this
/// crate's own output.
pub const GOLDEN_HASH_PAIR_12345_67890: &str =
    "0x1a52400b0566a6d2eb81fcf923da131e3f0db95e6e618ed4041225c78530a49a";
