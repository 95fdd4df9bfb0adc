use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

use crate::error::{HashgateTypesError, Result};

pub const FINGERPRINT_LEN: usize = 32;

/// Content-addressed digest of raw bytes. Opaque everywhere: equality is
/// exact byte equality and the value is never decoded or reversed. On
/// the wire and in storage it is the lowercase hex string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bytes: [u8; FINGERPRINT_LEN],
}

impl Fingerprint {
    pub fn compute(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let digest = hasher.finalize();
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self { bytes }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let decoded =
            hex::decode(hex_str.trim()).map_err(|_| HashgateTypesError::InvalidFingerprintHex)?;
        let bytes: [u8; FINGERPRINT_LEN] = decoded
            .try_into()
            .map_err(|_| HashgateTypesError::InvalidFingerprintHex)?;
        Ok(Self { bytes })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.bytes
    }

    /// First 8 hex chars, the only form that may appear in diagnostics.
    pub fn log_prefix(&self) -> String {
        hex::encode(&self.bytes[..4])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&value).map_err(D::Error::custom)
    }
}
