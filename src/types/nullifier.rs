//! [`Nullifier`]: a one-shot scalar consumed on-chain to prevent proof replay.

use serde::{Deserialize, Serialize};

/// A nullifier scalar, derived in the circuit from
/// `(identity_commitment, action_id)`. Held on-chain in a set; only ever
/// inserted, never removed (§3, §5 ordering guarantees).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

impl Nullifier {
    /// Big-endian hex interchange form, matching the external encoding rule
    /// in §4.1 (32-byte field elements are little-endian internally; hex
    /// interchange is big-endian).
    pub fn to_hex(self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse the big-endian hex interchange form.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let n = Nullifier([7u8; 32]);
        let hex = n.to_hex();
        assert_eq!(Nullifier::from_hex(&hex), Some(n));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(Nullifier::from_hex("0xdead"), None);
    }
}
