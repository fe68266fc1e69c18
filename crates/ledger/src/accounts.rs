use std::collections::{BTreeMap, BTreeSet};

use stakeledger_core::{Address, EntityDelta, EntityStore as _, LedgerError, Lovelace};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct BalanceCredit {
    address: Address,
    amount: Lovelace,
}

impl EntityDelta for BalanceCredit {
    type Key = Address;
    type Entity = Lovelace;

    fn key(&self) -> Address {
        self.address.clone()
    }

    fn apply(&mut self, entity: &mut Option<Lovelace>) {
        debug!(address = %self.address, amount = self.amount, "crediting balance");

        let balance = entity.get_or_insert(0);
        *balance = balance.saturating_add(self.amount);
    }
}

/// Withdraws from a balance that is known to cover the amount
#[derive(Debug, Clone)]
pub struct BalanceDebit {
    address: Address,
    amount: Lovelace,
}

impl EntityDelta for BalanceDebit {
    type Key = Address;
    type Entity = Lovelace;

    fn key(&self) -> Address {
        self.address.clone()
    }

    fn apply(&mut self, entity: &mut Option<Lovelace>) {
        debug!(address = %self.address, amount = self.amount, "debiting balance");

        let remaining = entity.unwrap_or_default().saturating_sub(self.amount);

        // empty accounts are dropped so that iteration only yields funded addresses
        *entity = (remaining > 0).then_some(remaining);
    }
}

/// Spendable balances keyed by address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountLedger {
    balances: BTreeMap<Address, Lovelace>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: &Address) -> Lovelace {
        self.balances.get(address).copied().unwrap_or_default()
    }

    pub fn credit(&mut self, address: &Address, amount: Lovelace) {
        if amount == 0 {
            return;
        }

        self.balances.apply_delta(&mut BalanceCredit {
            address: address.clone(),
            amount,
        });
    }

    pub fn debit(&mut self, address: &Address, amount: Lovelace) -> Result<(), LedgerError> {
        let available = self.balance_of(address);

        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                address: address.clone(),
                required: amount,
                available,
            });
        }

        if amount > 0 {
            self.balances.apply_delta(&mut BalanceDebit {
                address: address.clone(),
                amount,
            });
        }

        Ok(())
    }

    /// All funded addresses with their balance, in address order
    pub fn iter(&self) -> impl Iterator<Item = (&Address, Lovelace)> + '_ {
        self.balances.iter().map(|(k, v)| (k, *v))
    }

    pub fn total(&self) -> Lovelace {
        self.balances.values().sum()
    }

    pub(crate) fn slice(&self, keys: &BTreeSet<Address>) -> Self {
        let balances = keys
            .iter()
            .filter_map(|k| self.balances.get(k).map(|v| (k.clone(), *v)))
            .collect();

        Self { balances }
    }

    pub(crate) fn merge(&mut self, keys: &BTreeSet<Address>, slice: Self) {
        for key in keys {
            self.balances.remove(key);
        }

        self.balances.extend(slice.balances);
    }
}

impl FromIterator<(Address, Lovelace)> for AccountLedger {
    fn from_iter<T: IntoIterator<Item = (Address, Lovelace)>>(iter: T) -> Self {
        let mut ledger = Self::new();

        for (address, amount) in iter {
            ledger.credit(&address, amount);
        }

        ledger
    }
}
