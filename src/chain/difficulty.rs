use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use super::link::{Address, DIGEST_LEN};

/// A mining difficulty: a threshold in the digest value space. An address
/// qualifies iff, read as a big-endian unsigned integer, it is ≤ the
/// threshold. A lower threshold admits fewer digests and is therefore
/// harder.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Difficulty([u8; DIGEST_LEN]);

impl Difficulty {
    /// Every digest qualifies; mining succeeds on the first nonce.
    pub const TRIVIAL: Difficulty = Difficulty([0xff; DIGEST_LEN]);

    /// Only the all-zero digest qualifies; mining is effectively
    /// impossible within any practical budget.
    pub const IMPOSSIBLE: Difficulty = Difficulty([0u8; DIGEST_LEN]);

    /// Threshold requiring `bits` leading zero bits in a qualifying
    /// digest: the remaining bits are all ones. Expected work doubles per
    /// bit. `bits >= 256` collapses to `IMPOSSIBLE`.
    pub fn from_leading_zero_bits(bits: u32) -> Self {
        if bits as usize >= DIGEST_LEN * 8 {
            return Self::IMPOSSIBLE;
        }
        let mut threshold = [0u8; DIGEST_LEN];
        let zero_bytes = (bits / 8) as usize;
        let partial_bits = bits % 8;
        threshold[zero_bytes] = 0xffu8 >> partial_bits;
        for byte in threshold.iter_mut().skip(zero_bytes + 1) {
            *byte = 0xff;
        }
        Self(threshold)
    }

    pub fn from_bytes(threshold: [u8; DIGEST_LEN]) -> Self {
        Self(threshold)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Does `address` satisfy this threshold? Big-endian byte order makes
    /// the slice comparison equal to the numeric one.
    pub fn admits(&self, address: &Address) -> bool {
        address.as_bytes() <= &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Difficulty({})", self.to_hex())
    }
}

impl FromStr for Difficulty {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
