use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stakeledger_core::{
    CredentialId, EntityDelta, EntityStore as _, Epoch, LedgerError, Lovelace, PoolId,
    StakeAddressInfo, StakeDistribution,
};
use tracing::debug;

use crate::StakePoolRegistry;

/// A registered stake credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialState {
    pub credential: CredentialId,
    pub delegation: Option<PoolId>,
    pub reward_balance: Lovelace,
    pub deposit: Lovelace,
    pub registered_epoch: Epoch,
}

impl CredentialState {
    pub fn info(&self) -> StakeAddressInfo {
        StakeAddressInfo {
            credential: self.credential,
            delegation: self.delegation,
            reward_account_balance: self.reward_balance,
            deposit: self.deposit,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StakeRegistration {
    credential: CredentialId,
    deposit: Lovelace,
    epoch: Epoch,
}

impl EntityDelta for StakeRegistration {
    type Key = CredentialId;
    type Entity = CredentialState;

    fn key(&self) -> CredentialId {
        self.credential
    }

    fn apply(&mut self, entity: &mut Option<CredentialState>) {
        debug!(credential = %self.credential, deposit = self.deposit, "applying registration");

        *entity = Some(CredentialState {
            credential: self.credential,
            delegation: None,
            reward_balance: 0,
            deposit: self.deposit,
            registered_epoch: self.epoch,
        });
    }
}

#[derive(Debug, Clone)]
pub struct StakeDeregistration {
    credential: CredentialId,

    // outcome
    payout: Lovelace,
}

impl EntityDelta for StakeDeregistration {
    type Key = CredentialId;
    type Entity = CredentialState;

    fn key(&self) -> CredentialId {
        self.credential
    }

    fn apply(&mut self, entity: &mut Option<CredentialState>) {
        let Some(mut state) = entity.take() else {
            return;
        };

        // the deposit returns through the reward balance, which is then paid out whole
        state.reward_balance += state.deposit;
        state.delegation = None;

        debug!(
            credential = %self.credential,
            payout = state.reward_balance,
            "applying deregistration"
        );

        self.payout = state.reward_balance;
    }
}

#[derive(Debug, Clone)]
pub struct StakeDelegation {
    credential: CredentialId,
    pool: Option<PoolId>,
}

impl EntityDelta for StakeDelegation {
    type Key = CredentialId;
    type Entity = CredentialState;

    fn key(&self) -> CredentialId {
        self.credential
    }

    fn apply(&mut self, entity: &mut Option<CredentialState>) {
        if let Some(entity) = entity {
            debug!(credential = %self.credential, pool = ?self.pool, "applying delegation");
            entity.delegation = self.pool;
        }
    }
}

/// Moves value in or out of a reward balance
#[derive(Debug, Clone)]
pub struct RewardBalanceChange {
    credential: CredentialId,
    credit: Lovelace,
    debit: Lovelace,
}

impl EntityDelta for RewardBalanceChange {
    type Key = CredentialId;
    type Entity = CredentialState;

    fn key(&self) -> CredentialId {
        self.credential
    }

    fn apply(&mut self, entity: &mut Option<CredentialState>) {
        if let Some(entity) = entity {
            debug!(
                credential = %self.credential,
                credit = self.credit,
                debit = self.debit,
                "updating reward balance"
            );

            entity.reward_balance = entity.reward_balance + self.credit - self.debit;
        }
    }
}

/// Registered stake credentials and the pool each one delegates to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelegationTracker {
    credentials: BTreeMap<CredentialId, CredentialState>,
}

impl DelegationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn require(&self, credential: &CredentialId) -> Result<&CredentialState, LedgerError> {
        self.credentials
            .get(credential)
            .ok_or(LedgerError::UnknownCredential(*credential))
    }

    pub fn register_credential(
        &mut self,
        credential: &CredentialId,
        deposit: Lovelace,
        epoch: Epoch,
    ) -> Result<(), LedgerError> {
        if self.is_registered(credential) {
            return Err(LedgerError::AlreadyRegistered(*credential));
        }

        self.credentials.apply_delta(&mut StakeRegistration {
            credential: *credential,
            deposit,
            epoch,
        });

        Ok(())
    }

    /// Removes the credential and returns its deposit plus unclaimed rewards
    pub fn deregister_credential(&mut self, credential: &CredentialId) -> Result<Lovelace, LedgerError> {
        self.require(credential)?;

        let mut delta = StakeDeregistration {
            credential: *credential,
            payout: 0,
        };

        self.credentials.apply_delta(&mut delta);

        Ok(delta.payout)
    }

    pub fn delegate(
        &mut self,
        credential: &CredentialId,
        pool_id: &PoolId,
        registry: &StakePoolRegistry,
    ) -> Result<(), LedgerError> {
        self.require(credential)?;

        if !registry.is_active(pool_id) {
            return Err(LedgerError::UnknownPool(*pool_id));
        }

        self.credentials.apply_delta(&mut StakeDelegation {
            credential: *credential,
            pool: Some(*pool_id),
        });

        Ok(())
    }

    pub fn credit_reward(&mut self, credential: &CredentialId, amount: Lovelace) -> Result<(), LedgerError> {
        self.require(credential)?;

        self.credentials.apply_delta(&mut RewardBalanceChange {
            credential: *credential,
            credit: amount,
            debit: 0,
        });

        Ok(())
    }

    pub fn withdraw(&mut self, credential: &CredentialId, amount: Lovelace) -> Result<(), LedgerError> {
        let available = self.require(credential)?.reward_balance;

        if amount > available {
            return Err(LedgerError::MalformedInput {
                field: "withdrawals",
                reason: format!(
                    "withdrawal of {amount} from {credential} exceeds its reward balance of {available}"
                ),
            });
        }

        self.credentials.apply_delta(&mut RewardBalanceChange {
            credential: *credential,
            credit: 0,
            debit: amount,
        });

        Ok(())
    }

    /// Drops every delegation pointing at `pool_id`, returning how many there were
    pub fn clear_delegations_to(&mut self, pool_id: &PoolId) -> usize {
        let affected: Vec<_> = self
            .credentials
            .values()
            .filter(|c| c.delegation.as_ref() == Some(pool_id))
            .map(|c| c.credential)
            .collect();

        for credential in affected.iter() {
            self.credentials.apply_delta(&mut StakeDelegation {
                credential: *credential,
                pool: None,
            });
        }

        affected.len()
    }

    pub fn delegation_of(&self, credential: &CredentialId) -> Option<PoolId> {
        self.credentials.get(credential).and_then(|c| c.delegation)
    }

    pub fn is_registered(&self, credential: &CredentialId) -> bool {
        self.credentials.contains_key(credential)
    }

    pub fn get(&self, credential: &CredentialId) -> Option<&CredentialState> {
        self.credentials.get(credential)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialState> + '_ {
        self.credentials.values()
    }

    /// Delegators and their summed reward-balance weight, for every active pool
    pub fn stake_distribution(&self, registry: &StakePoolRegistry) -> StakeDistribution {
        let mut distribution: StakeDistribution = registry
            .list_active()
            .map(|pool| (pool.pool_id, Default::default()))
            .collect();

        for state in self.credentials.values() {
            let Some(pool) = state.delegation else {
                continue;
            };

            if let Some(entry) = distribution.get_mut(&pool) {
                entry.delegators.insert(state.credential);
                entry.stake += state.reward_balance;
            }
        }

        distribution
    }

    pub fn total_rewards(&self) -> Lovelace {
        self.credentials.values().map(|c| c.reward_balance).sum()
    }

    pub fn total_deposits(&self) -> Lovelace {
        self.credentials.values().map(|c| c.deposit).sum()
    }

    pub(crate) fn slice(&self, keys: &BTreeSet<CredentialId>) -> Self {
        let credentials = keys
            .iter()
            .filter_map(|k| self.credentials.get(k).map(|v| (*k, v.clone())))
            .collect();

        Self { credentials }
    }

    pub(crate) fn merge(&mut self, keys: &BTreeSet<CredentialId>, slice: Self) {
        for key in keys {
            self.credentials.remove(key);
        }

        self.credentials.extend(slice.credentials);
    }
}
