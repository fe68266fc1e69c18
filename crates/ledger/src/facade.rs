use std::sync::{Arc, RwLock};

use stakeledger_core::{
    config::GenesisConfig, Address, CredentialId, Epoch, LedgerError, Lovelace, PoolId, PoolState,
    Pots, ProtocolParams, ProtocolState, StakeAddressInfo, StakeDistribution, Transaction,
    TxRecord,
};

use crate::{fees, EpochScheduler, EpochSummary, LedgerState, RewardProvider, TransactionApplier};

/// The ledger with its scheduler and applier wired together
pub struct Ledger {
    state: LedgerState,
    scheduler: EpochScheduler,
    applier: TransactionApplier,
}

impl Ledger {
    pub fn new(state: LedgerState) -> Self {
        Self {
            state,
            scheduler: EpochScheduler::default(),
            applier: TransactionApplier::new(),
        }
    }

    pub fn from_genesis(genesis: &GenesisConfig) -> Self {
        Self::new(LedgerState::from_genesis(genesis))
    }

    pub fn with_rewards(mut self, rewards: impl RewardProvider + 'static) -> Self {
        self.scheduler = EpochScheduler::new(rewards);
        self
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn submit(&mut self, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        self.applier.apply(&mut self.state, tx)
    }

    /// Validates a transaction against the current state without applying it
    pub fn evaluate(&self, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        self.applier.evaluate(&self.state, tx)
    }

    pub fn advance_epoch(&mut self) -> EpochSummary {
        self.scheduler.advance_epoch(&mut self.state)
    }

    pub fn current_epoch(&self) -> Epoch {
        self.state.current_epoch()
    }

    pub fn protocol_parameters(&self) -> &ProtocolParams {
        &self.state.pparams
    }

    pub fn protocol_state(&self) -> ProtocolState {
        self.state.protocol_state()
    }

    pub fn stake_distribution(&self) -> StakeDistribution {
        self.state.delegations.stake_distribution(&self.state.pools)
    }

    pub fn pool_state(&self, pool_id: &PoolId) -> Option<PoolState> {
        self.state.pools.get(pool_id).cloned()
    }

    pub fn stake_address_info(&self, credential: &CredentialId) -> Option<StakeAddressInfo> {
        self.state.delegations.get(credential).map(|c| c.info())
    }

    pub fn address_balance(&self, address: &Address) -> Lovelace {
        self.state.accounts.balance_of(address)
    }

    pub fn min_fee(&self, tx: &Transaction) -> Lovelace {
        fees::min_fee(&self.state.pparams, tx)
    }

    pub fn pots(&self) -> Pots {
        self.state.pots
    }
}

/// A ledger shared between tasks
///
/// Submits and epoch transitions take the write lock; queries take the read
/// lock and so always observe the state between two transactions.
#[derive(Clone)]
pub struct SharedLedger(Arc<RwLock<Ledger>>);

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self(Arc::new(RwLock::new(ledger)))
    }

    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        let ledger = self.0.read().unwrap();
        f(&ledger)
    }

    pub fn submit(&self, tx: &Transaction) -> Result<TxRecord, LedgerError> {
        self.0.write().unwrap().submit(tx)
    }

    pub fn advance_epoch(&self) -> EpochSummary {
        self.0.write().unwrap().advance_epoch()
    }
}

impl From<Ledger> for SharedLedger {
    fn from(value: Ledger) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use stakeledger_core::{Certificate, PoolRegistrationCert, TxOutput, UnitInterval};

    use super::*;
    use crate::{balance_fee, FixedRewards};

    const FUNDS: Lovelace = 1_000_000_000_000;

    fn address(i: usize) -> Address {
        format!("addr_test1user{i}").parse().unwrap()
    }

    fn credential(i: usize) -> CredentialId {
        CredentialId::from_stake_key(format!("stake-{i}").as_bytes())
    }

    fn pool_cert(i: usize, cost: i64) -> PoolRegistrationCert {
        PoolRegistrationCert {
            cold_vkey: format!("cold-{i}").into_bytes(),
            vrf_keyhash: [i as u8; 32],
            pledge: 0,
            cost,
            margin: UnitInterval::new(1, 20),
            reward_account: credential(i),
            owners: vec![credential(i)],
            relays: vec![],
            metadata: None,
        }
    }

    fn ledger() -> Ledger {
        let genesis = GenesisConfig {
            epoch: 0,
            reserves: 10_000_000_000_000,
            funds: (0..3).map(|i| (address(i), FUNDS)).collect(),
            pparams: Default::default(),
        };

        Ledger::from_genesis(&genesis)
    }

    fn submit(ledger: &mut Ledger, source: usize, certificates: Vec<Certificate>) -> Result<TxRecord, LedgerError> {
        let mut tx = Transaction::new(address(source));
        tx.certificates = certificates;
        balance_fee(ledger.protocol_parameters(), &mut tx);
        ledger.submit(&tx)
    }

    #[test]
    fn retirement_refunds_owner_and_clears_delegations() {
        let mut ledger = ledger();
        let owner = credential(0);
        let delegator = credential(1);
        let cert = pool_cert(0, 340_000_000);
        let pool_id = cert.pool_id();

        submit(
            &mut ledger,
            0,
            vec![
                Certificate::StakeRegistration { credential: owner },
                Certificate::StakeRegistration {
                    credential: delegator,
                },
                Certificate::PoolRegistration(cert),
                Certificate::StakeDelegation {
                    credential: delegator,
                    pool_id,
                },
            ],
        )
        .unwrap();

        submit(&mut ledger, 0, vec![Certificate::PoolRetirement { pool_id, epoch: 2 }]).unwrap();

        let first = ledger.advance_epoch();
        assert!(first.retired_pools.is_empty());
        assert_eq!(ledger.stake_distribution()[&pool_id].delegators.len(), 1);

        let second = ledger.advance_epoch();
        assert_eq!(second.retired_pools, vec![pool_id]);
        assert_eq!(second.cleared_delegations, 1);

        let deposit = ledger.protocol_parameters().stake_pool_deposit;

        assert!(ledger.pool_state(&pool_id).is_none());
        assert!(ledger.stake_distribution().is_empty());
        assert_eq!(ledger.stake_address_info(&delegator).unwrap().delegation, None);
        assert_eq!(
            ledger.stake_address_info(&owner).unwrap().reward_account_balance,
            deposit
        );
    }

    #[test]
    fn deposit_of_unregistered_owner_goes_to_treasury() {
        let mut ledger = ledger();
        let cert = pool_cert(0, 340_000_000);
        let pool_id = cert.pool_id();

        submit(&mut ledger, 0, vec![Certificate::PoolRegistration(cert)]).unwrap();
        submit(&mut ledger, 0, vec![Certificate::PoolRetirement { pool_id, epoch: 1 }]).unwrap();

        let summary = ledger.advance_epoch();

        assert_eq!(summary.refunded_to_treasury, ledger.protocol_parameters().stake_pool_deposit);
        assert_eq!(ledger.pots().treasury, summary.refunded_to_treasury);
        assert_eq!(ledger.pots().deposits, 0);
    }

    #[test]
    fn pending_update_activates_at_boundary() {
        let mut ledger = ledger();

        let mut tx = Transaction::new(address(0));
        tx.update = Some(stakeledger_core::ProtocolParamUpdate {
            min_pool_cost: Some(5000),
            ..Default::default()
        });
        balance_fee(ledger.protocol_parameters(), &mut tx);
        ledger.submit(&tx).unwrap();

        assert_eq!(ledger.protocol_parameters().min_pool_cost, 0);

        let summary = ledger.advance_epoch();

        assert!(summary.params_updated);
        assert_eq!(ledger.protocol_parameters().min_pool_cost, 5000);
        assert!(ledger.protocol_state().pending_update.is_none());
    }

    #[test]
    fn huge_deposit_update_keeps_ledger_usable() {
        let shared = SharedLedger::from(ledger());

        let mut tx = Transaction::new(address(0));
        tx.certificates = vec![Certificate::StakeRegistration { credential: credential(0) }];
        tx.update = Some(stakeledger_core::ProtocolParamUpdate {
            stake_address_deposit: Some(stakeledger_core::MAX_COIN),
            ..Default::default()
        });
        shared.read(|l| balance_fee(l.protocol_parameters(), &mut tx));
        shared.submit(&tx).unwrap();

        let summary = shared.advance_epoch();
        assert!(summary.params_updated);

        let before = shared.read(|l| l.state().clone());

        let mut tx = Transaction::new(address(1));
        tx.certificates = vec![Certificate::StakeRegistration { credential: credential(1) }];
        shared.read(|l| balance_fee(l.protocol_parameters(), &mut tx));

        let err = shared.submit(&tx).unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(shared.read(|l| l.state().clone()), before);
        assert_eq!(shared.read(|l| l.protocol_state().epoch), 1);
    }

    #[test]
    fn rejected_oversized_update_never_activates() {
        let mut ledger = ledger();
        let pparams = ledger.protocol_parameters().clone();

        let mut tx = Transaction::new(address(0));
        tx.update = Some(stakeledger_core::ProtocolParamUpdate {
            tx_fee_fixed: Some(u64::MAX),
            ..Default::default()
        });
        balance_fee(ledger.protocol_parameters(), &mut tx);

        assert!(matches!(
            ledger.submit(&tx),
            Err(LedgerError::MalformedInput { field: "update", .. })
        ));

        let summary = ledger.advance_epoch();

        assert!(!summary.params_updated);
        assert_eq!(ledger.protocol_parameters(), &pparams);
    }

    #[test]
    fn fees_move_to_reserves() {
        let mut ledger = ledger();
        let reserves = ledger.pots().reserves;

        let record = submit(&mut ledger, 0, vec![]).unwrap();
        let summary = ledger.advance_epoch();

        assert_eq!(summary.fees_to_reserves, record.fee);
        assert_eq!(ledger.pots().fees, 0);
        assert_eq!(ledger.pots().reserves, reserves + record.fee);
    }

    #[test]
    fn rewards_are_paid_from_reserves_to_registered_credentials() {
        let mut ledger = ledger().with_rewards(FixedRewards(vec![(credential(0), 100), (credential(1), 50)]));

        submit(&mut ledger, 0, vec![Certificate::StakeRegistration { credential: credential(0) }]).unwrap();

        let supply = ledger.state().total_supply();
        let summary = ledger.advance_epoch();

        assert_eq!(summary.rewards_paid, 100);
        assert_eq!(
            ledger.stake_address_info(&credential(0)).unwrap().reward_account_balance,
            100
        );
        assert_eq!(ledger.state().total_supply(), supply);
    }

    #[test]
    fn shared_ledger_serializes_writes() {
        let shared = SharedLedger::new(ledger());

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    let mut tx = Transaction::new(address(i));
                    tx.outputs.push(TxOutput {
                        address: address((i + 1) % 3),
                        amount: 2_000_000,
                    });
                    shared.read(|l| balance_fee(l.protocol_parameters(), &mut tx));
                    shared.submit(&tx).unwrap()
                })
            })
            .collect();

        let mut seqs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().seq).collect();
        seqs.sort();

        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(shared.read(|l| l.protocol_state().last_seq), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Transfer(usize, usize, u64),
        RegisterCredential(usize, usize),
        DeregisterCredential(usize, usize),
        RegisterPool(usize, i64),
        Delegate(usize, usize),
        RetirePool(usize, u64),
        AdvanceEpoch,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize, 0..3usize, 1_000_000..50_000_000u64).prop_map(|(a, b, x)| Op::Transfer(a, b, x)),
            (0..3usize, 0..4usize).prop_map(|(a, c)| Op::RegisterCredential(a, c)),
            (0..3usize, 0..4usize).prop_map(|(a, c)| Op::DeregisterCredential(a, c)),
            (0..3usize, -10i64..400_000_000).prop_map(|(p, c)| Op::RegisterPool(p, c)),
            (0..4usize, 0..3usize).prop_map(|(c, p)| Op::Delegate(c, p)),
            (0..3usize, 0..4u64).prop_map(|(p, e)| Op::RetirePool(p, e)),
            Just(Op::AdvanceEpoch),
        ]
    }

    fn run(ledger: &mut Ledger, op: Op) {
        let epoch = ledger.current_epoch();

        let _ = match op {
            Op::Transfer(from, to, amount) => {
                let mut tx = Transaction::new(address(from));
                tx.outputs.push(TxOutput {
                    address: address(to),
                    amount: amount as i64,
                });
                balance_fee(ledger.protocol_parameters(), &mut tx);
                ledger.submit(&tx)
            }
            Op::RegisterCredential(from, c) => submit(
                ledger,
                from,
                vec![Certificate::StakeRegistration {
                    credential: credential(c),
                }],
            ),
            Op::DeregisterCredential(from, c) => submit(
                ledger,
                from,
                vec![Certificate::StakeDeregistration {
                    credential: credential(c),
                }],
            ),
            Op::RegisterPool(p, cost) => submit(ledger, p, vec![Certificate::PoolRegistration(pool_cert(p, cost))]),
            Op::Delegate(c, p) => submit(
                ledger,
                0,
                vec![Certificate::StakeDelegation {
                    credential: credential(c),
                    pool_id: pool_cert(p, 0).pool_id(),
                }],
            ),
            Op::RetirePool(p, offset) => submit(
                ledger,
                p,
                vec![Certificate::PoolRetirement {
                    pool_id: pool_cert(p, 0).pool_id(),
                    epoch: epoch + offset,
                }],
            ),
            Op::AdvanceEpoch => {
                ledger.advance_epoch();
                return;
            }
        };
    }

    proptest! {
        #[test]
        fn value_is_conserved(ops in prop::collection::vec(op(), 1..40)) {
            let mut ledger = ledger().with_rewards(FixedRewards(vec![(credential(0), 1_000)]));
            let supply = ledger.state().total_supply();

            for op in ops {
                run(&mut ledger, op);

                let state = ledger.state();
                prop_assert_eq!(state.total_supply(), supply);
                prop_assert_eq!(
                    state.pots.deposits,
                    state.pools.total_deposits() + state.delegations.total_deposits()
                );
            }
        }
    }
}
