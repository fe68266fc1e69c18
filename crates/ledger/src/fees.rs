use stakeledger_core::{Lovelace, ProtocolParams, Transaction};

/// Upper bound on fixpoint rounds in [`balance_fee`]; the size only grows
/// by a digit at a time so this is never reached in practice.
const MAX_BALANCE_ROUNDS: usize = 8;

/// The linear fee for a transaction of this size
pub fn min_fee(pparams: &ProtocolParams, tx: &Transaction) -> Lovelace {
    pparams
        .tx_fee_fixed
        .saturating_add(pparams.tx_fee_per_byte.saturating_mul(tx.size()))
}

/// Sets the fee of `tx` to the smallest value that covers its own size
///
/// Writing the fee changes the encoded size, so the fee is recomputed until
/// it stops moving.
pub fn balance_fee(pparams: &ProtocolParams, tx: &mut Transaction) -> Lovelace {
    for _ in 0..MAX_BALANCE_ROUNDS {
        let required = min_fee(pparams, tx);
        let current = u64::try_from(tx.fee).unwrap_or_default();

        if current >= required {
            return current;
        }

        tx.fee = i64::try_from(required).unwrap_or(i64::MAX);
    }

    u64::try_from(tx.fee).unwrap_or_default()
}
