use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;

use stakeledger::core::config::RootConfig;
use stakeledger::prelude::Error;

mod common;
mod daemon;
mod epoch;
mod pool;
mod query;
mod transaction;

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the ledger and serve it on a Unix socket
    Daemon(daemon::Args),

    /// Read ledger state from a running daemon
    #[command(subcommand)]
    Query(query::Command),

    /// Build, price and submit transactions
    #[command(subcommand)]
    Transaction(transaction::Command),

    /// Drive or wait for epoch boundaries
    #[command(subcommand)]
    Epoch(epoch::Command),

    /// Offline pool helpers
    #[command(subcommand)]
    Pool(pool::Command),
}

#[derive(Debug, Parser)]
#[clap(name = "stakeledger")]
#[clap(bin_name = "stakeledger")]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

pub type Config = RootConfig;

fn load_config(explicit_file: &Option<PathBuf>) -> Result<Config, Error> {
    let mut s = config::Config::builder();

    // our base config will always be in /etc/stakeledger
    s = s.add_source(config::File::with_name("/etc/stakeledger/daemon.toml").required(false));

    // but we can override it by having a file in the working dir
    s = s.add_source(config::File::with_name("stakeledger.toml").required(false));

    // if an explicit file was passed, then we load it as mandatory
    if let Some(explicit) = explicit_file.as_ref().and_then(|x| x.to_str()) {
        s = s.add_source(config::File::with_name(explicit).required(true));
    }

    // finally, we use env vars to make some last-step overrides
    s = s.add_source(
        config::Environment::with_prefix("STAKELEDGER")
            .separator("__")
            .prefix_separator("_"),
    );

    s.build()
        .and_then(|x| x.try_deserialize())
        .map_err(Error::config)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = load_config(&args.config)?;

    match args.command {
        Command::Daemon(x) => daemon::run(config, &x)?,
        Command::Query(x) => query::run(&config, &x)?,
        Command::Transaction(x) => transaction::run(&config, &x)?,
        Command::Epoch(x) => epoch::run(&config, &x)?,
        Command::Pool(x) => pool::run(&x)?,
    };

    Ok(())
}
