use serde::{Deserialize, Serialize};
use stakeledger_core::{CredentialId, Epoch, Lovelace, PoolId};
use tracing::{debug, info, warn};

use crate::LedgerState;

/// Source of the rewards paid at an epoch boundary
///
/// Reward computation is outside of this ledger; implementations decide who
/// gets what and the scheduler only moves the value out of the reserves.
pub trait RewardProvider: Send + Sync {
    fn rewards(&self, epoch: Epoch, state: &LedgerState) -> Vec<(CredentialId, Lovelace)>;
}

/// Pays nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRewards;

impl RewardProvider for NoRewards {
    fn rewards(&self, _: Epoch, _: &LedgerState) -> Vec<(CredentialId, Lovelace)> {
        vec![]
    }
}

/// Pays fixed amounts every epoch, mostly useful for tests and devnets
#[derive(Debug, Clone, Default)]
pub struct FixedRewards(pub Vec<(CredentialId, Lovelace)>);

impl RewardProvider for FixedRewards {
    fn rewards(&self, _: Epoch, _: &LedgerState) -> Vec<(CredentialId, Lovelace)> {
        self.0.clone()
    }
}

/// What happened when an epoch boundary was crossed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: Epoch,
    pub retired_pools: Vec<PoolId>,
    pub refunded: Lovelace,
    pub refunded_to_treasury: Lovelace,
    pub cleared_delegations: usize,
    pub params_updated: bool,
    pub fees_to_reserves: Lovelace,
    pub rewards_paid: Lovelace,
}

pub struct EpochScheduler {
    rewards: Box<dyn RewardProvider>,
}

impl Default for EpochScheduler {
    fn default() -> Self {
        Self::new(NoRewards)
    }
}

impl EpochScheduler {
    pub fn new(rewards: impl RewardProvider + 'static) -> Self {
        Self {
            rewards: Box::new(rewards),
        }
    }

    /// Crosses into the next epoch and finalizes everything deferred to it
    pub fn advance_epoch(&self, state: &mut LedgerState) -> EpochSummary {
        state.epoch += 1;

        let mut summary = EpochSummary {
            epoch: state.epoch,
            ..Default::default()
        };

        retire_pools(state, &mut summary);
        activate_update(state, &mut summary);

        summary.fees_to_reserves = std::mem::take(&mut state.pots.fees);
        state.pots.reserves += summary.fees_to_reserves;

        self.pay_rewards(state, &mut summary);

        info!(
            epoch = summary.epoch,
            retired = summary.retired_pools.len(),
            rewards = summary.rewards_paid,
            "epoch transition"
        );

        summary
    }

    fn pay_rewards(&self, state: &mut LedgerState, summary: &mut EpochSummary) {
        for (credential, amount) in self.rewards.rewards(state.epoch, state) {
            if !state.delegations.is_registered(&credential) {
                debug!(%credential, "skipping reward for unregistered credential");
                continue;
            }

            let amount = amount.min(state.pots.reserves);

            if amount == 0 {
                continue;
            }

            if state.delegations.credit_reward(&credential, amount).is_ok() {
                state.pots.reserves -= amount;
                summary.rewards_paid += amount;
            }
        }
    }
}

fn retire_pools(state: &mut LedgerState, summary: &mut EpochSummary) {
    for pool in state.pools.retire_pools(state.epoch) {
        state.pots.deposits -= pool.deposit;

        let owner = pool.params.owners.first().copied();

        let refunded = match owner {
            Some(owner) => state.delegations.credit_reward(&owner, pool.deposit).is_ok(),
            None => false,
        };

        if refunded {
            summary.refunded += pool.deposit;
        } else {
            warn!(pool = %pool.pool_id, "owner not registered, pool deposit goes to treasury");
            state.pots.treasury += pool.deposit;
            summary.refunded_to_treasury += pool.deposit;
        }

        summary.cleared_delegations += state.delegations.clear_delegations_to(&pool.pool_id);
        summary.retired_pools.push(pool.pool_id);
    }
}

fn activate_update(state: &mut LedgerState, summary: &mut EpochSummary) {
    if let Some(update) = state.pending_update.take() {
        debug!(?update, "activating protocol parameter update");
        state.pparams = state.pparams.apply_update(&update);
        summary.params_updated = true;
    }
}
