use std::{fmt, str::FromStr};

use bech32::{Bech32, Hrp};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::hash::{HashError, KeyHash};

const POOL_HRP: Hrp = Hrp::parse_unchecked("pool");
const STAKE_HRP: Hrp = Hrp::parse_unchecked("stake_vkh");

const MAX_ADDRESS_LEN: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid bech32: {0}")]
    Bech32(#[from] bech32::DecodeError),

    #[error("unexpected bech32 prefix `{0}`")]
    UnexpectedPrefix(String),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("invalid address `{0}`")]
    InvalidAddress(String),
}

fn encode_bech32(hrp: Hrp, hash: &KeyHash, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let encoded = bech32::encode::<Bech32>(hrp, hash.as_slice()).map_err(|_| fmt::Error)?;
    f.write_str(&encoded)
}

/// Accepts either the bech32 form with the expected prefix or the raw hex hash.
fn decode_hash(hrp: Hrp, s: &str) -> Result<KeyHash, IdError> {
    if s.len() == KeyHash::LEN * 2 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(s.parse()?);
    }

    let (found, data) = bech32::decode(s)?;

    if found != hrp {
        return Err(IdError::UnexpectedPrefix(found.to_string()));
    }

    Ok(KeyHash::try_from(data.as_slice())?)
}

/// The id of a stake pool, derived from its cold verification key
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct PoolId(KeyHash);

impl PoolId {
    pub fn from_cold_key(cold_vkey: &[u8]) -> Self {
        Self(KeyHash::of_key(cold_vkey))
    }

    pub fn hash(&self) -> &KeyHash {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_string()
    }
}

impl From<KeyHash> for PoolId {
    fn from(value: KeyHash) -> Self {
        Self(value)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_bech32(POOL_HRP, &self.0, f)
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({self})")
    }
}

impl FromStr for PoolId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hash(POOL_HRP, s).map(Self)
    }
}

/// The id of a stake credential (hash of the stake verification key)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct CredentialId(KeyHash);

impl CredentialId {
    pub fn from_stake_key(stake_vkey: &[u8]) -> Self {
        Self(KeyHash::of_key(stake_vkey))
    }

    pub fn hash(&self) -> &KeyHash {
        &self.0
    }
}

impl From<KeyHash> for CredentialId {
    fn from(value: KeyHash) -> Self {
        Self(value)
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        encode_bech32(STAKE_HRP, &self.0, f)
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialId({self})")
    }
}

impl FromStr for CredentialId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hash(STAKE_HRP, s).map(Self)
    }
}

/// A payment address
///
/// Addresses are opaque to the ledger. They are only checked for shape so that
/// garbage coming from the wire is rejected before it reaches the state.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl FromStr for Address {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = !s.is_empty()
            && s.len() <= MAX_ADDRESS_LEN
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !well_formed {
            return Err(IdError::InvalidAddress(s.to_owned()));
        }

        Ok(Self(s.to_owned()))
    }
}
