use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{
    Address, CredentialId, Epoch, KeyHash, LedgerError, Lovelace, PoolId, ProtocolParamUpdate,
    TxSeq,
};

/// A coin amount as it arrives from a client
///
/// Amounts are signed on the wire so that negative values can be reported as
/// malformed input instead of failing deep inside a decoder.
pub type RawCoin = i64;

/// Validates a wire amount into a ledger amount
pub fn coin(field: &'static str, value: RawCoin) -> Result<Lovelace, LedgerError> {
    u64::try_from(value).map_err(|_| LedgerError::MalformedInput {
        field,
        reason: format!("negative amount {value}"),
    })
}

/// A rational in the closed interval [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInterval {
    pub numerator: u64,
    pub denominator: u64,
}

impl UnitInterval {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn validate(&self, field: &'static str) -> Result<(), LedgerError> {
        if self.denominator == 0 || self.numerator > self.denominator {
            return Err(LedgerError::MalformedInput {
                field,
                reason: format!("{}/{} is not in [0, 1]", self.numerator, self.denominator),
            });
        }

        Ok(())
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetadata {
    pub url: String,
    #[serde_as(as = "Hex")]
    pub hash: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Relay {
    SingleHostAddr { host: String, port: Option<u16> },
    SingleHostName { dns: String, port: Option<u16> },
    MultiHostName { dns: String },
}

/// A pool registration certificate as submitted
///
/// The pool id is not part of the certificate, it is derived from the cold
/// verification key so that re-registering with the same key always updates
/// the same pool.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRegistrationCert {
    #[serde_as(as = "Hex")]
    pub cold_vkey: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub vrf_keyhash: [u8; 32],
    pub pledge: RawCoin,
    pub cost: RawCoin,
    pub margin: UnitInterval,
    pub reward_account: CredentialId,
    pub owners: Vec<CredentialId>,
    #[serde(default)]
    pub relays: Vec<Relay>,
    #[serde(default)]
    pub metadata: Option<PoolMetadata>,
}

impl PoolRegistrationCert {
    pub fn pool_id(&self) -> PoolId {
        PoolId::from_cold_key(&self.cold_vkey)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Certificate {
    PoolRegistration(PoolRegistrationCert),
    PoolRetirement {
        pool_id: PoolId,
        epoch: Epoch,
    },
    StakeRegistration {
        credential: CredentialId,
    },
    StakeDeregistration {
        credential: CredentialId,
    },
    StakeDelegation {
        credential: CredentialId,
        pool_id: PoolId,
    },
}

/// The phase in which a certificate is applied within its transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CertPhase {
    Registration,
    Delegation,
    Deregistration,
}

impl Certificate {
    pub fn phase(&self) -> CertPhase {
        match self {
            Self::PoolRegistration(_) | Self::StakeRegistration { .. } => CertPhase::Registration,
            Self::StakeDelegation { .. } => CertPhase::Delegation,
            Self::PoolRetirement { .. } | Self::StakeDeregistration { .. } => {
                CertPhase::Deregistration
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub amount: RawCoin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub credential: CredentialId,
    pub amount: RawCoin,
}

/// Opaque signing evidence, carried for size accounting only
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub vkey_hash: KeyHash,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub source: Address,
    pub fee: RawCoin,
    #[serde(default)]
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<ProtocolParamUpdate>,
    #[serde(default)]
    pub witnesses: Vec<Witness>,
}

impl Transaction {
    pub fn new(source: Address) -> Self {
        Self {
            source,
            fee: 0,
            outputs: vec![],
            certificates: vec![],
            withdrawals: vec![],
            update: None,
            witnesses: vec![],
        }
    }

    /// Size in bytes used for fee computation (length of the canonical JSON encoding)
    pub fn size(&self) -> u64 {
        serde_json::to_vec(self)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or_default()
    }
}

/// The outcome of an accepted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    pub seq: TxSeq,
    pub epoch: Epoch,
    pub fee: Lovelace,
    pub deposits_locked: Lovelace,
    pub refunds: Lovelace,
    pub withdrawn: Lovelace,
    pub source_balance: Lovelace,
}
