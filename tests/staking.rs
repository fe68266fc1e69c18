//! End-to-end staking scenarios driven through the ledger harness.

use stakeledger_core::{Certificate, LedgerError, ProtocolParamUpdate};
use stakeledger_testing::{LedgerHarness, PoolBuilder, TestAddress, INITIAL_FUNDS};

#[test]
fn pool_cost_floor_after_parameter_update() {
    let mut harness = LedgerHarness::default();

    harness
        .update_params(ProtocolParamUpdate {
            min_pool_cost: Some(5000),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(harness.pparams().min_pool_cost, 5000);

    let accepted = harness.register_pool(TestAddress::Alice, PoolBuilder::new(TestAddress::Alice).cost(5000));
    assert!(accepted.is_ok());

    let below = harness
        .register_pool(TestAddress::Alice, PoolBuilder::new(TestAddress::Alice).cost(4999))
        .unwrap_err();

    assert_eq!(
        below,
        LedgerError::InvalidParameters {
            cost: 4999,
            min_pool_cost: 5000
        }
    );

    let negative = harness
        .register_pool(TestAddress::Alice, PoolBuilder::new(TestAddress::Alice).cost(-1))
        .unwrap_err();

    assert!(matches!(negative, LedgerError::MalformedInput { field: "cost", .. }));
}

#[test]
fn key_deposit_is_refunded_exactly() {
    let mut harness = LedgerHarness::default();
    let key_deposit = harness.pparams().stake_address_deposit;

    let register = harness.register_stake(TestAddress::Bob).unwrap();
    assert_eq!(register.deposits_locked, key_deposit);
    assert_eq!(
        harness.balance(TestAddress::Bob),
        INITIAL_FUNDS - key_deposit - register.fee
    );

    let deregister = harness.deregister_stake(TestAddress::Bob).unwrap();
    assert_eq!(deregister.refunds, key_deposit);
    assert_eq!(
        harness.balance(TestAddress::Bob),
        INITIAL_FUNDS - register.fee - deregister.fee
    );

    let again = harness.deregister_stake(TestAddress::Bob).unwrap_err();
    assert_eq!(again, LedgerError::UnknownCredential(TestAddress::Bob.credential()));
}

#[test]
fn pool_reregistration_keeps_single_deposit() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Carol).cold_key("carol-cold");
    let pool_id = pool.pool_id();

    let first = harness.register_pool(TestAddress::Carol, pool.clone()).unwrap();
    let second = harness
        .register_pool(TestAddress::Carol, pool.pledge(50_000_000).metadata("https://carol.example/pool.json"))
        .unwrap();

    let pool_deposit = harness.pparams().stake_pool_deposit;

    assert_eq!(first.deposits_locked, pool_deposit);
    assert_eq!(second.deposits_locked, 0);
    assert_eq!(
        harness.balance(TestAddress::Carol),
        INITIAL_FUNDS - pool_deposit - first.fee - second.fee
    );

    let state = harness.ledger.pool_state(&pool_id).unwrap();
    assert_eq!(state.params.pledge, 50_000_000);
    assert!(state.params.metadata.is_some());
}

#[test]
fn retirement_clears_delegations_at_target_epoch() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Alice);
    let pool_id = pool.pool_id();

    harness.register_stake(TestAddress::Alice).unwrap();
    harness.register_pool(TestAddress::Alice, pool).unwrap();
    harness.register_stake(TestAddress::Dave).unwrap();
    harness.delegate(TestAddress::Dave, pool_id).unwrap();

    let target = harness.epoch() + 2;
    harness.retire_pool(TestAddress::Alice, pool_id, target).unwrap();

    harness.advance_epochs(1);
    assert!(harness.ledger.pool_state(&pool_id).is_some());
    assert_eq!(
        harness.ledger.stake_address_info(&TestAddress::Dave.credential()).unwrap().delegation,
        Some(pool_id)
    );

    let summaries = harness.advance_epochs(1);
    assert_eq!(summaries[0].retired_pools, vec![pool_id]);

    assert!(harness.ledger.pool_state(&pool_id).is_none());
    assert!(!harness.ledger.stake_distribution().contains_key(&pool_id));

    let dave = harness.ledger.stake_address_info(&TestAddress::Dave.credential()).unwrap();
    assert_eq!(dave.delegation, None);

    let alice = harness.ledger.stake_address_info(&TestAddress::Alice.credential()).unwrap();
    assert_eq!(alice.reward_account_balance, harness.pparams().stake_pool_deposit);
}

#[test]
fn delegating_to_retired_pool_fails() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Alice);
    let pool_id = pool.pool_id();

    harness.register_pool(TestAddress::Alice, pool).unwrap();
    harness.retire_pool(TestAddress::Alice, pool_id, 1).unwrap();
    harness.advance_epochs(1);

    harness.register_stake(TestAddress::Eve).unwrap();
    let err = harness.delegate(TestAddress::Eve, pool_id).unwrap_err();

    assert_eq!(err, LedgerError::UnknownPool(pool_id));
}

#[test]
fn retirement_outside_window_is_rejected() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Alice);
    let pool_id = pool.pool_id();

    harness.register_pool(TestAddress::Alice, pool).unwrap();

    let max = harness.pparams().pool_retire_max_epoch;
    let current = harness.epoch();

    for target in [current, current + max + 1] {
        let err = harness.retire_pool(TestAddress::Alice, pool_id, target).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEpoch { .. }));
    }

    harness.retire_pool(TestAddress::Alice, pool_id, current + max).unwrap();
}

#[test]
fn register_and_delegate_atomically() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Bob);
    let pool_id = pool.pool_id();
    let bob = TestAddress::Bob.credential();

    let tx = harness.tx(
        TestAddress::Bob,
        vec![
            Certificate::StakeRegistration { credential: bob },
            Certificate::PoolRegistration(pool.build()),
            Certificate::StakeDelegation {
                credential: bob,
                pool_id,
            },
        ],
    );

    harness.submit(&tx).unwrap();

    let distribution = harness.ledger.stake_distribution();
    assert!(distribution[&pool_id].delegators.contains(&bob));
}

#[test]
fn failed_certificate_rolls_back_whole_tx() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Bob);
    let bob = TestAddress::Bob.credential();
    let before = harness.ledger.state().clone();

    let tx = harness.tx(
        TestAddress::Bob,
        vec![
            Certificate::StakeRegistration { credential: bob },
            Certificate::PoolRegistration(pool.build()),
            Certificate::StakeDelegation {
                credential: bob,
                pool_id: PoolBuilder::new(TestAddress::Eve).pool_id(),
            },
        ],
    );

    assert!(matches!(harness.submit(&tx), Err(LedgerError::UnknownPool(_))));
    assert_eq!(harness.ledger.state(), &before);
}

#[test]
fn delegate_then_deregister() {
    let mut harness = LedgerHarness::default();
    let pool = PoolBuilder::new(TestAddress::Alice);
    let pool_id = pool.pool_id();
    let carol = TestAddress::Carol.credential();

    harness.register_pool(TestAddress::Alice, pool).unwrap();
    harness.register_stake(TestAddress::Carol).unwrap();
    harness.delegate(TestAddress::Carol, pool_id).unwrap();

    assert_eq!(harness.ledger.stake_distribution()[&pool_id].delegators.len(), 1);

    harness.deregister_stake(TestAddress::Carol).unwrap();

    assert!(harness.ledger.stake_address_info(&carol).is_none());
    assert!(harness.ledger.stake_distribution()[&pool_id].delegators.is_empty());

    let err = harness.delegate(TestAddress::Carol, pool_id).unwrap_err();
    assert_eq!(err, LedgerError::UnknownCredential(carol));
}

#[test]
fn deregistration_pays_out_unclaimed_rewards() {
    let mut harness = LedgerHarness::default().with_rewards(stakeledger_ledger::FixedRewards(vec![(
        TestAddress::Dave.credential(),
        1_234,
    )]));

    let register = harness.register_stake(TestAddress::Dave).unwrap();
    harness.advance_epochs(2);

    let withdraw = harness.withdraw(TestAddress::Dave, 1_000).unwrap();
    let deregister = harness.deregister_stake(TestAddress::Dave).unwrap();

    assert_eq!(deregister.withdrawn, 2 * 1_234 - 1_000);
    assert_eq!(
        harness.balance(TestAddress::Dave),
        INITIAL_FUNDS + 2 * 1_234 - register.fee - withdraw.fee - deregister.fee
    );
}

#[test]
fn transfers_respect_balances() {
    let mut harness = LedgerHarness::default();

    let record = harness.transfer(TestAddress::Alice, TestAddress::Bob, 7_000_000).unwrap();

    assert_eq!(harness.balance(TestAddress::Bob), INITIAL_FUNDS + 7_000_000);
    assert_eq!(
        harness.balance(TestAddress::Alice),
        INITIAL_FUNDS - 7_000_000 - record.fee
    );

    let err = harness
        .transfer(TestAddress::Alice, TestAddress::Bob, INITIAL_FUNDS)
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
}
