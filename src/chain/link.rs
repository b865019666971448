use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use sha2::{Digest, Sha256};

use super::difficulty::Difficulty;

/// Width of a link address in bytes (SHA-256 output).
pub const DIGEST_LEN: usize = 32;

/// A link's content-derived address: the SHA-256 digest of its
/// `(parent_address, payload, nonce)`. Serializes as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; DIGEST_LEN]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; DIGEST_LEN]> for Address {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Compute the address for a link's content. Pure and deterministic:
/// identical inputs always produce the identical digest.
///
/// The preimage is domain-separated (a tag byte distinguishes genesis from
/// non-genesis) and the payload is length-prefixed, so no two distinct
/// field combinations share a preimage by concatenation.
pub fn derive_address(parent_address: Option<&Address>, payload: &[u8], nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    match parent_address {
        Some(parent) => {
            hasher.update([1u8]);
            hasher.update(parent.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update((payload.len() as u64).to_be_bytes());
    hasher.update(payload);
    hasher.update(nonce.to_be_bytes());
    let digest: [u8; DIGEST_LEN] = hasher.finalize().into();
    Address(digest)
}

/// A single immutable link in the chain. The address is computed at
/// construction and is never settable; "editing" a link means building a
/// new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub(crate) parent_address: Option<Address>,
    #[serde(with = "hex_bytes")]
    pub(crate) payload: Vec<u8>,
    pub(crate) nonce: u64,
    pub(crate) address: Address,
}

impl Link {
    /// Build a link from its content; the address is derived immediately.
    pub fn new(parent_address: Option<Address>, payload: Vec<u8>, nonce: u64) -> Self {
        let address = derive_address(parent_address.as_ref(), &payload, nonce);
        Self {
            parent_address,
            payload,
            nonce,
            address,
        }
    }

    /// `None` only for the genesis link.
    pub fn parent_address(&self) -> Option<&Address> {
        self.parent_address.as_ref()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn is_genesis(&self) -> bool {
        self.parent_address.is_none()
    }

    /// Recompute the address from the stored content, ignoring the cached
    /// value. Verification compares this against `address()`.
    pub fn recompute_address(&self) -> Address {
        derive_address(self.parent_address.as_ref(), &self.payload, self.nonce)
    }

    /// Check this link in isolation: cached address matches its content and
    /// satisfies the difficulty threshold. (Does NOT check chain linkage.)
    pub fn is_valid(&self, difficulty: Difficulty) -> bool {
        let recomputed = self.recompute_address();
        recomputed == self.address && difficulty.admits(&recomputed)
    }

    /// The persisted form of this link.
    pub fn record(&self) -> LinkRecord {
        LinkRecord {
            parent_address: self.parent_address,
            payload: self.payload.clone(),
            nonce: self.nonce,
        }
    }

    /// Rebuild a link from its persisted form, recomputing the address.
    pub fn from_record(record: LinkRecord) -> Self {
        Self::new(record.parent_address, record.payload, record.nonce)
    }
}

/// Persisted representation of a link: content only. The address is never
/// stored as authoritative — it is recomputed on load, so on-disk tampering
/// surfaces as a verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub parent_address: Option<Address>,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    pub nonce: u64,
}

/// Serde helpers rendering opaque byte payloads as hex strings.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(de::Error::custom)
    }
}
