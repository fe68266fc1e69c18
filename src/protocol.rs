//! Messages exchanged over the daemon socket.
//!
//! Each request and each response is a single JSON document on its own line.

use serde::{Deserialize, Serialize};
use stakeledger_core::{
    Address, CredentialId, ErrorCode, LedgerError, Lovelace, PoolId, PoolState, Pots,
    ProtocolParams, ProtocolState, StakeAddressInfo, StakeDistribution, Transaction, TxRecord,
};
use stakeledger_ledger::EpochSummary;

/// Longest line either side accepts
pub const MAX_LINE_LENGTH: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    ProtocolParameters,
    ProtocolState,
    StakeDistribution,
    PoolState { pool_id: PoolId },
    StakeAddressInfo { credential: CredentialId },
    Balance { address: Address },
    Pots,
    MinFee { tx: Transaction },
    Evaluate { tx: Transaction },
    Submit { tx: Transaction },
    AdvanceEpoch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reply {
    ProtocolParameters(ProtocolParams),
    ProtocolState(ProtocolState),
    StakeDistribution(StakeDistribution),
    PoolState(Option<PoolState>),
    StakeAddressInfo(Option<StakeAddressInfo>),
    Balance(Lovelace),
    Pots(Pots),
    MinFee(Lovelace),
    TxRecord(TxRecord),
    EpochSummary(EpochSummary),
}

/// A ledger error as it travels over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&LedgerError> for Rejection {
    fn from(value: &LedgerError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Reply),
    Rejected(Rejection),
    BadRequest(String),
}
