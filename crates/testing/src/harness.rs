use stakeledger_core::{
    config::GenesisConfig, Certificate, Epoch, LedgerError, Lovelace, PoolId, ProtocolParamUpdate,
    ProtocolParams, Transaction, TxOutput, TxRecord, Withdrawal,
};
use stakeledger_ledger::{balance_fee, EpochSummary, Ledger, RewardProvider};

use crate::{PoolBuilder, TestAddress, INITIAL_FUNDS};

/// A ledger where every [`TestAddress`] starts with [`INITIAL_FUNDS`]
///
/// Helpers build a transaction around the given certificates, balance its
/// fee and submit it from the given participant.
pub struct LedgerHarness {
    pub ledger: Ledger,
}

impl Default for LedgerHarness {
    fn default() -> Self {
        Self::new(ProtocolParams::default())
    }
}

impl LedgerHarness {
    pub fn new(pparams: ProtocolParams) -> Self {
        let genesis = GenesisConfig {
            epoch: 0,
            reserves: 45_000_000_000_000_000,
            funds: TestAddress::everyone()
                .iter()
                .map(|x| (x.address(), INITIAL_FUNDS))
                .collect(),
            pparams,
        };

        Self {
            ledger: Ledger::from_genesis(&genesis),
        }
    }

    pub fn with_rewards(mut self, rewards: impl RewardProvider + 'static) -> Self {
        self.ledger = self.ledger.with_rewards(rewards);
        self
    }

    pub fn pparams(&self) -> &ProtocolParams {
        self.ledger.protocol_parameters()
    }

    pub fn epoch(&self) -> Epoch {
        self.ledger.current_epoch()
    }

    pub fn balance(&self, who: impl Into<TestAddress>) -> Lovelace {
        self.ledger.address_balance(&who.into().address())
    }

    /// A fee-balanced transaction from `from` carrying `certificates`
    pub fn tx(&self, from: impl Into<TestAddress>, certificates: Vec<Certificate>) -> Transaction {
        let mut tx = Transaction::new(from.into().address());
        tx.certificates = certificates;
        balance_fee(self.pparams(), &mut tx);
        tx
    }

    pub fn submit(&mut self, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        self.ledger.submit(tx)
    }

    pub fn submit_certs(
        &mut self,
        from: impl Into<TestAddress>,
        certificates: Vec<Certificate>,
    ) -> Result<TxRecord, LedgerError> {
        let tx = self.tx(from, certificates);
        self.submit(&tx)
    }

    pub fn transfer(
        &mut self,
        from: impl Into<TestAddress>,
        to: impl Into<TestAddress>,
        amount: Lovelace,
    ) -> Result<TxRecord, LedgerError> {
        let mut tx = Transaction::new(from.into().address());
        tx.outputs.push(TxOutput {
            address: to.into().address(),
            amount: amount as i64,
        });
        balance_fee(self.pparams(), &mut tx);
        self.submit(&tx)
    }

    pub fn register_stake(&mut self, who: impl Into<TestAddress>) -> Result<TxRecord, LedgerError> {
        let who = who.into();
        let cert = Certificate::StakeRegistration {
            credential: who.credential(),
        };

        self.submit_certs(who, vec![cert])
    }

    pub fn deregister_stake(&mut self, who: impl Into<TestAddress>) -> Result<TxRecord, LedgerError> {
        let who = who.into();
        let cert = Certificate::StakeDeregistration {
            credential: who.credential(),
        };

        self.submit_certs(who, vec![cert])
    }

    pub fn delegate(
        &mut self,
        who: impl Into<TestAddress>,
        pool_id: PoolId,
    ) -> Result<TxRecord, LedgerError> {
        let who = who.into();
        let cert = Certificate::StakeDelegation {
            credential: who.credential(),
            pool_id,
        };

        self.submit_certs(who, vec![cert])
    }

    /// Registers the pool built by `pool`, paid for by its first owner
    pub fn register_pool(
        &mut self,
        from: impl Into<TestAddress>,
        pool: PoolBuilder,
    ) -> Result<TxRecord, LedgerError> {
        self.submit_certs(from, vec![Certificate::PoolRegistration(pool.build())])
    }

    pub fn retire_pool(
        &mut self,
        from: impl Into<TestAddress>,
        pool_id: PoolId,
        epoch: Epoch,
    ) -> Result<TxRecord, LedgerError> {
        self.submit_certs(from, vec![Certificate::PoolRetirement { pool_id, epoch }])
    }

    pub fn withdraw(
        &mut self,
        who: impl Into<TestAddress>,
        amount: Lovelace,
    ) -> Result<TxRecord, LedgerError> {
        let who = who.into();
        let mut tx = Transaction::new(who.address());
        tx.withdrawals.push(Withdrawal {
            credential: who.credential(),
            amount: amount as i64,
        });
        balance_fee(self.pparams(), &mut tx);
        self.submit(&tx)
    }

    /// Proposes `update` and crosses the boundary so that it is in effect
    pub fn update_params(&mut self, update: ProtocolParamUpdate) -> Result<EpochSummary, LedgerError> {
        let mut tx = Transaction::new(TestAddress::Alice.address());
        tx.update = Some(update);
        balance_fee(self.pparams(), &mut tx);
        self.submit(&tx)?;

        Ok(self.ledger.advance_epoch())
    }

    pub fn advance_epochs(&mut self, count: u64) -> Vec<EpochSummary> {
        (0..count).map(|_| self.ledger.advance_epoch()).collect()
    }
}
