use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::{
    CredentialId, Epoch, Lovelace, PoolId, PoolMetadata, ProtocolParamUpdate, Relay, TxSeq,
    UnitInterval,
};

/// Validated pool parameters as kept by the ledger
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    #[serde_as(as = "Hex")]
    pub vrf_keyhash: [u8; 32],
    pub pledge: Lovelace,
    pub cost: Lovelace,
    pub margin: UnitInterval,
    pub reward_account: CredentialId,
    pub owners: Vec<CredentialId>,
    pub relays: Vec<Relay>,
    pub metadata: Option<PoolMetadata>,
}

/// The ledger view of a registered pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub pool_id: PoolId,
    pub params: PoolParams,
    pub registration_epoch: Epoch,
    pub retirement_epoch: Option<Epoch>,
    pub deposit: Lovelace,
}

/// What `query stake-address-info` reports for a registered credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeAddressInfo {
    pub credential: CredentialId,
    pub delegation: Option<PoolId>,
    pub reward_account_balance: Lovelace,
    pub deposit: Lovelace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDistribution {
    pub delegators: BTreeSet<CredentialId>,
    pub stake: Lovelace,
}

pub type StakeDistribution = BTreeMap<PoolId, PoolDistribution>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolState {
    pub epoch: Epoch,
    /// Sequence number of the last applied transaction
    ///
    /// There is no slot clock, so clients reading `lastSlot` as the tip get
    /// this counter, which only moves forward with each accepted transaction.
    #[serde(rename = "lastSlot")]
    pub last_seq: TxSeq,
    pub pending_update: Option<ProtocolParamUpdate>,
}

/// Global value pots that, together with balances, hold the whole supply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pots {
    pub reserves: Lovelace,
    pub treasury: Lovelace,
    pub deposits: Lovelace,
    pub fees: Lovelace,
}

impl Pots {
    pub fn total(&self) -> Lovelace {
        self.reserves + self.treasury + self.deposits + self.fees
    }
}
