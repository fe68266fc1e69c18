use miette::{Context, IntoDiagnostic};
use tracing::info;

use stakeledger::ledger::{Ledger, SharedLedger};

#[derive(Debug, clap::Args)]
pub struct Args {}

#[tokio::main]
pub async fn run(config: super::Config, _args: &Args) -> miette::Result<()> {
    crate::common::setup_tracing(&config.logging)?;

    let ledger = SharedLedger::new(Ledger::from_genesis(&config.genesis));

    info!(
        epoch = config.genesis.epoch,
        funded = config.genesis.funds.len(),
        "ledger initialized from genesis"
    );

    let exit = crate::common::hook_exit_token();

    stakeledger::serve::serve(config.serve, ledger, exit)
        .await
        .into_diagnostic()
        .context("serving ledger socket")?;

    Ok(())
}
