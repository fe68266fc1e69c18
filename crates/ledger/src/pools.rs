use std::collections::{BTreeMap, BTreeSet};

use stakeledger_core::{
    coin, EntityDelta, EntityStore as _, Epoch, LedgerError, Lovelace, PoolId, PoolParams,
    PoolRegistrationCert, PoolState,
};
use tracing::debug;

/// Validates a registration certificate into ledger pool params
///
/// Negative amounts are reported as malformed before the cost floor is
/// checked, so a cost of `-1` never surfaces as an invalid-parameters error.
pub fn validate_params(
    cert: &PoolRegistrationCert,
    min_pool_cost: Lovelace,
) -> Result<PoolParams, LedgerError> {
    let cost = coin("cost", cert.cost)?;
    let pledge = coin("pledge", cert.pledge)?;

    cert.margin.validate("margin")?;

    if cert.owners.is_empty() {
        return Err(LedgerError::MalformedInput {
            field: "owners",
            reason: "a pool needs at least one owner".into(),
        });
    }

    if cert.cold_vkey.is_empty() {
        return Err(LedgerError::MalformedInput {
            field: "cold_vkey",
            reason: "empty verification key".into(),
        });
    }

    if cost < min_pool_cost {
        return Err(LedgerError::InvalidParameters {
            cost,
            min_pool_cost,
        });
    }

    Ok(PoolParams {
        vrf_keyhash: cert.vrf_keyhash,
        pledge,
        cost,
        margin: cert.margin,
        reward_account: cert.reward_account,
        owners: cert.owners.clone(),
        relays: cert.relays.clone(),
        metadata: cert.metadata.clone(),
    })
}

#[derive(Debug, Clone)]
pub struct PoolRegistration {
    pool_id: PoolId,
    params: PoolParams,
    epoch: Epoch,
    deposit: Lovelace,

    // outcome
    is_new: Option<bool>,
}

impl EntityDelta for PoolRegistration {
    type Key = PoolId;
    type Entity = PoolState;

    fn key(&self) -> PoolId {
        self.pool_id
    }

    fn apply(&mut self, entity: &mut Option<PoolState>) {
        if let Some(entity) = entity {
            debug!(pool = %self.pool_id, "updating pool registration");

            // re-registration takes effect right away and revokes a pending retirement
            entity.params = self.params.clone();
            entity.retirement_epoch = None;

            self.is_new = Some(false);
        } else {
            debug!(pool = %self.pool_id, deposit = self.deposit, "applying pool registration");

            *entity = Some(PoolState {
                pool_id: self.pool_id,
                params: self.params.clone(),
                registration_epoch: self.epoch,
                retirement_epoch: None,
                deposit: self.deposit,
            });

            self.is_new = Some(true);
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolRetirementScheduled {
    pool_id: PoolId,
    epoch: Epoch,
}

impl EntityDelta for PoolRetirementScheduled {
    type Key = PoolId;
    type Entity = PoolState;

    fn key(&self) -> PoolId {
        self.pool_id
    }

    fn apply(&mut self, entity: &mut Option<PoolState>) {
        if let Some(entity) = entity {
            debug!(pool = %self.pool_id, epoch = self.epoch, "scheduling pool retirement");
            entity.retirement_epoch = Some(self.epoch);
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolRetired {
    pool_id: PoolId,

    // outcome
    retired: Option<PoolState>,
}

impl EntityDelta for PoolRetired {
    type Key = PoolId;
    type Entity = PoolState;

    fn key(&self) -> PoolId {
        self.pool_id
    }

    fn apply(&mut self, entity: &mut Option<PoolState>) {
        debug!(pool = %self.pool_id, "retiring pool");
        self.retired = entity.take();
    }
}

/// What a registration certificate did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A new pool was created and this deposit must be locked
    Created { deposit: Lovelace },

    /// An active pool had its params replaced, no deposit is taken
    Updated,
}

impl RegistrationOutcome {
    pub fn deposit(&self) -> Lovelace {
        match self {
            Self::Created { deposit } => *deposit,
            Self::Updated => 0,
        }
    }
}

/// The set of registered (active or retiring) stake pools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakePoolRegistry {
    pools: BTreeMap<PoolId, PoolState>,
}

impl StakePoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        cert: &PoolRegistrationCert,
        deposit: Lovelace,
        min_pool_cost: Lovelace,
        epoch: Epoch,
    ) -> Result<RegistrationOutcome, LedgerError> {
        let params = validate_params(cert, min_pool_cost)?;

        let mut delta = PoolRegistration {
            pool_id: cert.pool_id(),
            params,
            epoch,
            deposit,
            is_new: None,
        };

        self.pools.apply_delta(&mut delta);

        match delta.is_new {
            Some(true) => Ok(RegistrationOutcome::Created { deposit }),
            _ => Ok(RegistrationOutcome::Updated),
        }
    }

    pub fn schedule_retirement(
        &mut self,
        pool_id: &PoolId,
        target_epoch: Epoch,
        current_epoch: Epoch,
        max_horizon: Epoch,
    ) -> Result<(), LedgerError> {
        if !self.is_active(pool_id) {
            return Err(LedgerError::UnknownPool(*pool_id));
        }

        let max = current_epoch.saturating_add(max_horizon);

        if target_epoch <= current_epoch || target_epoch > max {
            return Err(LedgerError::InvalidEpoch {
                target: target_epoch,
                current: current_epoch,
                max,
            });
        }

        self.pools.apply_delta(&mut PoolRetirementScheduled {
            pool_id: *pool_id,
            epoch: target_epoch,
        });

        Ok(())
    }

    /// Removes every pool scheduled to retire at `epoch` and hands them back
    pub fn retire_pools(&mut self, epoch: Epoch) -> Vec<PoolState> {
        let due: Vec<_> = self
            .pools
            .values()
            .filter(|p| p.retirement_epoch == Some(epoch))
            .map(|p| p.pool_id)
            .collect();

        let mut retired = Vec::with_capacity(due.len());

        for pool_id in due {
            let mut delta = PoolRetired {
                pool_id,
                retired: None,
            };

            self.pools.apply_delta(&mut delta);
            retired.extend(delta.retired);
        }

        retired
    }

    pub fn is_active(&self, pool_id: &PoolId) -> bool {
        self.pools.contains_key(pool_id)
    }

    pub fn get(&self, pool_id: &PoolId) -> Option<&PoolState> {
        self.pools.get(pool_id)
    }

    pub fn list_active(&self) -> impl Iterator<Item = &PoolState> + '_ {
        self.pools.values()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Sum of all locked pool deposits
    pub fn total_deposits(&self) -> Lovelace {
        self.pools.values().map(|p| p.deposit).sum()
    }

    pub(crate) fn slice(&self, keys: &BTreeSet<PoolId>) -> Self {
        let pools = keys
            .iter()
            .filter_map(|k| self.pools.get(k).map(|v| (*k, v.clone())))
            .collect();

        Self { pools }
    }

    pub(crate) fn merge(&mut self, keys: &BTreeSet<PoolId>, slice: Self) {
        for key in keys {
            self.pools.remove(key);
        }

        self.pools.extend(slice.pools);
    }
}
