use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};
use sha2::{Digest, Sha224};

/// A 28-byte digest of a verification key
///
/// Both pool ids and stake credentials are identified by the hash of the key
/// that controls them. The hash is computed with SHA-224 so that ids are
/// stable across runs and independent of how the key was encoded upstream.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct KeyHash([u8; KeyHash::LEN]);

impl KeyHash {
    pub const LEN: usize = 28;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn of_key(vkey: &[u8]) -> Self {
        let digest = Sha224::digest(vkey);

        let mut out = [0u8; Self::LEN];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for KeyHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for KeyHash {
    type Error = HashError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; Self::LEN] = value
            .try_into()
            .map_err(|_| HashError::InvalidLength(value.len()))?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash({self})")
    }
}

impl FromStr for KeyHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("expected {len} bytes, got {0}", len = KeyHash::LEN)]
    InvalidLength(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_preserves_digest() {
        let hash = KeyHash::of_key(b"cold key");
        let parsed: KeyHash = hash.to_string().parse().unwrap();

        assert_eq!(hash, parsed);
        assert_eq!(hash.to_string().len(), KeyHash::LEN * 2);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "abcd".parse::<KeyHash>().unwrap_err();
        assert!(matches!(err, HashError::InvalidLength(2)));
        assert_eq!(err.to_string(), "expected 28 bytes, got 2");

        let err = "zz".parse::<KeyHash>().unwrap_err();
        assert!(matches!(err, HashError::InvalidHex(_)));
    }

    #[test]
    fn same_key_same_hash() {
        assert_eq!(KeyHash::of_key(b"a"), KeyHash::of_key(b"a"));
        assert_ne!(KeyHash::of_key(b"a"), KeyHash::of_key(b"b"));
    }
}
