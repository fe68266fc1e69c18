use serde::{Deserialize, Serialize};
use thiserror::Error;

mod hash;
mod ids;
mod pparams;
mod query;
mod state;
mod tx;

pub mod config;

/// An amount of the native asset, in its smallest unit
pub type Lovelace = u64;

/// The index of an epoch
pub type Epoch = u64;

/// The position of an accepted transaction in the ledger history
pub type TxSeq = u64;

pub use hash::*;
pub use ids::*;
pub use pparams::*;
pub use query::*;
pub use state::*;
pub use tx::*;

/// Reasons a request is rejected by the ledger
///
/// Every one of these is raised before any state is mutated, so a caller that
/// receives an error can assume the ledger is exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient funds at {address}: required {required}, available {available}")]
    InsufficientFunds {
        address: Address,
        required: Lovelace,
        available: Lovelace,
    },

    #[error("unknown pool {0}")]
    UnknownPool(PoolId),

    #[error("unknown stake credential {0}")]
    UnknownCredential(CredentialId),

    #[error("stake credential {0} is already registered")]
    AlreadyRegistered(CredentialId),

    #[error("invalid pool parameters: cost {cost} is below the minimum pool cost {min_pool_cost}")]
    InvalidParameters { cost: Lovelace, min_pool_cost: Lovelace },

    #[error("malformed {field}: {reason}")]
    MalformedInput { field: &'static str, reason: String },

    #[error("invalid retirement epoch {target}: must be after {current} and at most {max}")]
    InvalidEpoch {
        target: Epoch,
        current: Epoch,
        max: Epoch,
    },

    #[error("fee too small: required {required}, provided {provided}")]
    FeeTooSmall { required: Lovelace, provided: Lovelace },
}

/// A stable, serializable tag for each kind of [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InsufficientFunds,
    UnknownPool,
    UnknownCredential,
    AlreadyRegistered,
    InvalidParameters,
    MalformedInput,
    InvalidEpoch,
    FeeTooSmall,
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            Self::UnknownPool(_) => ErrorCode::UnknownPool,
            Self::UnknownCredential(_) => ErrorCode::UnknownCredential,
            Self::AlreadyRegistered(_) => ErrorCode::AlreadyRegistered,
            Self::InvalidParameters { .. } => ErrorCode::InvalidParameters,
            Self::MalformedInput { .. } => ErrorCode::MalformedInput,
            Self::InvalidEpoch { .. } => ErrorCode::InvalidEpoch,
            Self::FeeTooSmall { .. } => ErrorCode::FeeTooSmall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_snake_case() {
        let err = LedgerError::InvalidParameters {
            cost: 4999,
            min_pool_cost: 5000,
        };

        let json = serde_json::to_string(&err.code()).unwrap();
        assert_eq!(json, "\"invalid_parameters\"");
    }

    #[test]
    fn messages_carry_amounts() {
        let err = LedgerError::FeeTooSmall {
            required: 170_000,
            provided: 1,
        };

        assert_eq!(
            err.to_string(),
            "fee too small: required 170000, provided 1"
        );
    }
}
