use stakeledger_ledger::SharedLedger;
use tracing::info;

use crate::protocol::{Rejection, Reply, Request, Response};

/// Answers a single request against the shared ledger
pub fn handle(ledger: &SharedLedger, request: Request) -> Response {
    let result = match request {
        Request::ProtocolParameters => Ok(Reply::ProtocolParameters(
            ledger.read(|l| l.protocol_parameters().clone()),
        )),
        Request::ProtocolState => Ok(Reply::ProtocolState(ledger.read(|l| l.protocol_state()))),
        Request::StakeDistribution => Ok(Reply::StakeDistribution(
            ledger.read(|l| l.stake_distribution()),
        )),
        Request::PoolState { pool_id } => {
            Ok(Reply::PoolState(ledger.read(|l| l.pool_state(&pool_id))))
        }
        Request::StakeAddressInfo { credential } => Ok(Reply::StakeAddressInfo(
            ledger.read(|l| l.stake_address_info(&credential)),
        )),
        Request::Balance { address } => {
            Ok(Reply::Balance(ledger.read(|l| l.address_balance(&address))))
        }
        Request::Pots => Ok(Reply::Pots(ledger.read(|l| l.pots()))),
        Request::MinFee { tx } => Ok(Reply::MinFee(ledger.read(|l| l.min_fee(&tx)))),
        Request::Evaluate { tx } => ledger.read(|l| l.evaluate(&tx)).map(Reply::TxRecord),
        Request::Submit { tx } => ledger.submit(&tx).map(Reply::TxRecord),
        Request::AdvanceEpoch => {
            let summary = ledger.advance_epoch();
            info!(epoch = summary.epoch, "epoch advanced on request");
            Ok(Reply::EpochSummary(summary))
        }
    };

    match result {
        Ok(reply) => Response::Ok(reply),
        Err(err) => Response::Rejected(Rejection::from(&err)),
    }
}

#[cfg(test)]
mod tests {
    use stakeledger_core::{config::GenesisConfig, ErrorCode, PoolId, Transaction};
    use stakeledger_ledger::Ledger;

    use super::*;

    fn ledger() -> SharedLedger {
        let genesis = GenesisConfig {
            funds: [("addr_test1alice".parse().unwrap(), 10_000_000_000)].into(),
            ..Default::default()
        };

        Ledger::from_genesis(&genesis).into()
    }

    #[test]
    fn unknown_pool_is_none_not_error() {
        let response = handle(
            &ledger(),
            Request::PoolState {
                pool_id: PoolId::from_cold_key(b"ghost"),
            },
        );

        assert_eq!(response, Response::Ok(Reply::PoolState(None)));
    }

    #[test]
    fn ledger_errors_become_rejections() {
        let tx = Transaction::new("addr_test1alice".parse().unwrap());
        let response = handle(&ledger(), Request::Submit { tx });

        let Response::Rejected(rejection) = response else {
            panic!("expected rejection");
        };

        assert_eq!(rejection.code, ErrorCode::FeeTooSmall);
    }

    #[test]
    fn advance_epoch_is_visible_to_queries() {
        let ledger = ledger();

        handle(&ledger, Request::AdvanceEpoch);

        let Response::Ok(Reply::ProtocolState(state)) = handle(&ledger, Request::ProtocolState)
        else {
            panic!("expected protocol state");
        };

        assert_eq!(state.epoch, 1);
    }
}
