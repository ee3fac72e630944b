//! Hex interchange encoding for [`FieldElement`](super::poseidon::FieldElement)s.
//!
//! Field elements are little-endian internally but big-endian in every
//! external hex representation — API responses, Merkle proof JSON, CLI
//! output (§4.1). Getting this backwards silently produces a value that
//! hashes differently from the circuit's, so both directions are tested
//! against a fixed, hand-checked vector rather than only round-tripping.

use super::poseidon::FieldElement;

/// Parse a `0x`-prefixed (or bare) big-endian hex string into a field element.
pub fn field_from_hex_be(s: &str) -> Option<FieldElement> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if s.len() > 64 {
        return None;
    }
    let mut padded = "0".repeat(64 - s.len());
    padded.push_str(s);
    let be_bytes = hex::decode(&padded).ok()?;
    let mut le_bytes = [0u8; 32];
    for (i, b) in be_bytes.iter().rev().enumerate() {
        le_bytes[i] = *b;
    }
    Some(FieldElement::from_le_bytes(le_bytes))
}

/// Render a field element as `0x`-prefixed big-endian hex.
pub fn field_to_hex_be(fe: FieldElement) -> String {
    let mut be_bytes = fe.0;
    be_bytes.reverse();
    format!("0x{}", hex::encode(be_bytes))
}
