//! Holder identities

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::HOLDER_ID_SIZE;
use crate::LedgerError;

/// 20-byte identity of a reservation holder or the ledger owner
///
/// The all-zero identity marks an unreserved day and never acts as a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HolderId(pub [u8; HOLDER_ID_SIZE]);

impl HolderId {
    pub const ZERO: HolderId = HolderId([0u8; HOLDER_ID_SIZE]);

    pub fn new(bytes: [u8; HOLDER_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HOLDER_ID_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; HOLDER_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for HolderId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; HOLDER_ID_SIZE] = hex_bytes::decode_fixed(s)
            .map_err(|e| LedgerError::InvalidHolder(format!("{s:?}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for HolderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_bytes::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for HolderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex_bytes::deserialize(deserializer).map(HolderId)
    }
}

/// `0x`-prefixed hex for fixed-size byte arrays
pub(crate) mod hex_bytes {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], String> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| e.to_string())?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| format!("expected {} bytes, got {}", N, len))
    }

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        decode_fixed(&s).map_err(serde::de::Error::custom)
    }
}
