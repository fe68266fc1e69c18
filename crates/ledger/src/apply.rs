use stakeledger_core::{
    coin, Certificate, CertPhase, LedgerError, Lovelace, Transaction, TxRecord, MAX_COIN,
};
use tracing::{debug, info, warn};

use crate::{fees, Footprint, LedgerState};

/// Collects every key a transaction can read or write
pub fn footprint(tx: &Transaction) -> Footprint {
    let mut footprint = Footprint::default();

    footprint.addresses.insert(tx.source.clone());
    footprint
        .addresses
        .extend(tx.outputs.iter().map(|o| o.address.clone()));

    footprint
        .credentials
        .extend(tx.withdrawals.iter().map(|w| w.credential));

    for cert in tx.certificates.iter() {
        match cert {
            Certificate::PoolRegistration(reg) => {
                footprint.pools.insert(reg.pool_id());
            }
            Certificate::PoolRetirement { pool_id, .. } => {
                footprint.pools.insert(*pool_id);
            }
            Certificate::StakeRegistration { credential }
            | Certificate::StakeDeregistration { credential } => {
                footprint.credentials.insert(*credential);
            }
            Certificate::StakeDelegation {
                credential,
                pool_id,
            } => {
                footprint.credentials.insert(*credential);
                footprint.pools.insert(*pool_id);
            }
        }
    }

    footprint
}

#[derive(Debug, Default)]
struct Settlement {
    deposits_locked: Lovelace,
    refunds: Lovelace,
    withdrawn: Lovelace,
}

impl Settlement {
    fn lock(&mut self, deposit: Lovelace) -> Result<(), LedgerError> {
        self.deposits_locked = self
            .deposits_locked
            .checked_add(deposit)
            .ok_or_else(|| overflow("certificates"))?;

        Ok(())
    }
}

fn overflow(field: &'static str) -> LedgerError {
    LedgerError::MalformedInput {
        field,
        reason: "amount overflows the total supply".into(),
    }
}

/// Validates and applies transactions as a single all-or-nothing step
///
/// A transaction is run against a slice of the state holding only the keys in
/// its footprint. The real state is only touched once the whole transaction,
/// settlement included, succeeded on the slice.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionApplier;

impl TransactionApplier {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(&self, state: &mut LedgerState, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        let footprint = footprint(tx);
        let mut slice = state.slice(&footprint);

        let record = self.run(&mut slice, tx).inspect_err(|err| {
            warn!(source = %tx.source, %err, "transaction rejected");
        })?;

        state.merge(&footprint, slice);

        info!(
            seq = record.seq,
            source = %tx.source,
            fee = record.fee,
            certificates = tx.certificates.len(),
            "transaction applied"
        );

        Ok(record)
    }

    /// Runs the full validation without committing anything
    pub fn evaluate(&self, state: &LedgerState, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        let mut slice = state.slice(&footprint(tx));
        self.run(&mut slice, tx)
    }

    fn run(&self, slice: &mut LedgerState, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        let fee = self.check_fee(slice, tx)?;
        let outputs = self.check_outputs(slice, tx)?;

        if let Some(update) = &tx.update {
            if update.is_empty() {
                return Err(LedgerError::MalformedInput {
                    field: "update",
                    reason: "empty protocol parameter update".into(),
                });
            }

            if let Some((name, value)) = update.oversized_amount() {
                return Err(LedgerError::MalformedInput {
                    field: "update",
                    reason: format!("{name} of {value} exceeds the largest coin {MAX_COIN}"),
                });
            }
        }

        let mut settlement = Settlement::default();

        let mut certs: Vec<_> = tx.certificates.iter().collect();
        certs.sort_by_key(|c| c.phase());

        let (early, late): (Vec<_>, Vec<_>) = certs
            .into_iter()
            .partition(|c| c.phase() < CertPhase::Deregistration);

        for cert in early {
            self.apply_cert(slice, cert, &mut settlement)?;
        }

        for withdrawal in tx.withdrawals.iter() {
            let amount = coin("withdrawals", withdrawal.amount)?;
            slice.delegations.withdraw(&withdrawal.credential, amount)?;

            settlement.withdrawn = settlement
                .withdrawn
                .checked_add(amount)
                .ok_or_else(|| overflow("withdrawals"))?;
        }

        for cert in late {
            self.apply_cert(slice, cert, &mut settlement)?;
        }

        // deposits locked in this tx may be refunded by a later cert of the same tx
        slice.pots.deposits = slice
            .pots
            .deposits
            .checked_add(settlement.deposits_locked)
            .and_then(|x| x.checked_sub(settlement.refunds))
            .ok_or_else(|| overflow("certificates"))?;

        let received = settlement
            .refunds
            .checked_add(settlement.withdrawn)
            .ok_or_else(|| overflow("withdrawals"))?;

        slice.accounts.credit(&tx.source, received);

        let spent = outputs
            .iter()
            .try_fold(fee, |acc, (_, amount)| acc.checked_add(*amount))
            .and_then(|x| x.checked_add(settlement.deposits_locked))
            .ok_or_else(|| overflow("outputs"))?;

        slice.accounts.debit(&tx.source, spent)?;

        for (address, amount) in outputs {
            slice.accounts.credit(address, amount);
        }

        slice.pots.fees = slice
            .pots
            .fees
            .checked_add(fee)
            .ok_or_else(|| overflow("fee"))?;

        if let Some(update) = &tx.update {
            slice
                .pending_update
                .get_or_insert_with(Default::default)
                .merge(update);
        }

        slice.last_seq += 1;

        Ok(TxRecord {
            seq: slice.last_seq,
            epoch: slice.epoch,
            fee,
            deposits_locked: settlement.deposits_locked,
            refunds: settlement.refunds,
            withdrawn: settlement.withdrawn,
            source_balance: slice.accounts.balance_of(&tx.source),
        })
    }

    fn check_fee(&self, slice: &LedgerState, tx: &Transaction) -> Result<Lovelace, LedgerError> {
        let fee = coin("fee", tx.fee)?;
        let size = tx.size();

        if size > slice.pparams.max_tx_size {
            return Err(LedgerError::MalformedInput {
                field: "transaction",
                reason: format!(
                    "size {size} exceeds the maximum of {}",
                    slice.pparams.max_tx_size
                ),
            });
        }

        let required = fees::min_fee(&slice.pparams, tx);

        if fee < required {
            return Err(LedgerError::FeeTooSmall {
                required,
                provided: fee,
            });
        }

        Ok(fee)
    }

    fn check_outputs<'a>(
        &self,
        slice: &LedgerState,
        tx: &'a Transaction,
    ) -> Result<Vec<(&'a stakeledger_core::Address, Lovelace)>, LedgerError> {
        let min = slice.pparams.min_utxo_value;

        tx.outputs
            .iter()
            .map(|output| {
                let amount = coin("outputs", output.amount)?;

                if amount < min {
                    return Err(LedgerError::MalformedInput {
                        field: "outputs",
                        reason: format!("output of {amount} to {} is below {min}", output.address),
                    });
                }

                Ok((&output.address, amount))
            })
            .collect()
    }

    fn apply_cert(
        &self,
        slice: &mut LedgerState,
        cert: &Certificate,
        settlement: &mut Settlement,
    ) -> Result<(), LedgerError> {
        debug!(?cert, "applying certificate");

        let epoch = slice.epoch;

        match cert {
            Certificate::PoolRegistration(reg) => {
                let outcome = slice.pools.register(
                    reg,
                    slice.pparams.stake_pool_deposit,
                    slice.pparams.min_pool_cost,
                    epoch,
                )?;

                settlement.lock(outcome.deposit())?;
            }
            Certificate::StakeRegistration { credential } => {
                let deposit = slice.pparams.stake_address_deposit;
                slice
                    .delegations
                    .register_credential(credential, deposit, epoch)?;

                settlement.lock(deposit)?;
            }
            Certificate::StakeDelegation {
                credential,
                pool_id,
            } => {
                slice
                    .delegations
                    .delegate(credential, pool_id, &slice.pools)?;
            }
            Certificate::PoolRetirement {
                pool_id,
                epoch: target,
            } => {
                slice.pools.schedule_retirement(
                    pool_id,
                    *target,
                    epoch,
                    slice.pparams.pool_retire_max_epoch,
                )?;
            }
            Certificate::StakeDeregistration { credential } => {
                let deposit = slice
                    .delegations
                    .get(credential)
                    .map(|c| c.deposit)
                    .ok_or(LedgerError::UnknownCredential(*credential))?;

                let payout = slice.delegations.deregister_credential(credential)?;

                settlement.refunds = settlement
                    .refunds
                    .checked_add(deposit)
                    .ok_or_else(|| overflow("certificates"))?;

                settlement.withdrawn = payout
                    .checked_sub(deposit)
                    .and_then(|x| settlement.withdrawn.checked_add(x))
                    .ok_or_else(|| overflow("certificates"))?;
            }
        }

        Ok(())
    }
}
