use std::collections::BTreeSet;

use stakeledger_core::{
    config::GenesisConfig, Address, CredentialId, Epoch, Lovelace, PoolId, Pots, ProtocolParamUpdate,
    ProtocolParams, ProtocolState, TxSeq,
};

use crate::{AccountLedger, DelegationTracker, StakePoolRegistry};

/// The keys a transaction reads or writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    pub addresses: BTreeSet<Address>,
    pub credentials: BTreeSet<CredentialId>,
    pub pools: BTreeSet<PoolId>,
}

/// Everything the ledger knows at a given point
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerState {
    pub epoch: Epoch,
    pub last_seq: TxSeq,
    pub accounts: AccountLedger,
    pub pools: StakePoolRegistry,
    pub delegations: DelegationTracker,
    pub pots: Pots,
    pub pparams: ProtocolParams,
    pub pending_update: Option<ProtocolParamUpdate>,
}

impl LedgerState {
    pub fn from_genesis(genesis: &GenesisConfig) -> Self {
        Self {
            epoch: genesis.epoch,
            last_seq: 0,
            accounts: genesis.funds.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            pools: StakePoolRegistry::new(),
            delegations: DelegationTracker::new(),
            pots: Pots {
                reserves: genesis.reserves,
                ..Default::default()
            },
            pparams: genesis.pparams.clone(),
            pending_update: None,
        }
    }

    pub fn current_epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn protocol_state(&self) -> ProtocolState {
        ProtocolState {
            epoch: self.epoch,
            last_seq: self.last_seq,
            pending_update: self.pending_update.clone(),
        }
    }

    /// Total value held anywhere in the ledger
    ///
    /// No operation changes this number; value only moves between balances,
    /// reward balances and the pots.
    pub fn total_supply(&self) -> Lovelace {
        self.accounts.total() + self.delegations.total_rewards() + self.pots.total()
    }

    /// Copies the part of the state covered by `footprint` into a detached state
    pub fn slice(&self, footprint: &Footprint) -> Self {
        Self {
            epoch: self.epoch,
            last_seq: self.last_seq,
            accounts: self.accounts.slice(&footprint.addresses),
            pools: self.pools.slice(&footprint.pools),
            delegations: self.delegations.slice(&footprint.credentials),
            pots: self.pots,
            pparams: self.pparams.clone(),
            pending_update: self.pending_update.clone(),
        }
    }

    /// Writes back a slice previously taken with the same footprint
    pub fn merge(&mut self, footprint: &Footprint, slice: Self) {
        self.accounts.merge(&footprint.addresses, slice.accounts);
        self.pools.merge(&footprint.pools, slice.pools);
        self.delegations
            .merge(&footprint.credentials, slice.delegations);

        self.last_seq = slice.last_seq;
        self.pots = slice.pots;
        self.pending_update = slice.pending_update;
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::from_genesis(&GenesisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_supply_is_reserves_plus_funds() {
        let alice: Address = "alice".parse().unwrap();

        let genesis = GenesisConfig {
            epoch: 4,
            reserves: 1_000,
            funds: [(alice.clone(), 50)].into(),
            pparams: Default::default(),
        };

        let state = LedgerState::from_genesis(&genesis);

        assert_eq!(state.current_epoch(), 4);
        assert_eq!(state.accounts.balance_of(&alice), 50);
        assert_eq!(state.total_supply(), 1_050);
    }
}
