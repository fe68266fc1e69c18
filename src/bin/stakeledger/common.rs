use std::path::PathBuf;

use miette::{Context as _, IntoDiagnostic};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{filter::Targets, prelude::*};

use stakeledger::client::{resolve_socket_path, Client};
use stakeledger::core::config::LoggingConfig;
use stakeledger::poll::RetryPolicy;
use stakeledger::prelude::Error;

pub fn setup_tracing(config: &LoggingConfig) -> miette::Result<()> {
    let level = config.max_level;

    let mut filter = Targets::new().with_target("stakeledger", level);

    if config.include_tokio {
        filter = filter.with_target("tokio", level);
    }

    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish()
        .with(filter)
        .init();

    Ok(())
}

pub fn hook_exit_token() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel2 = cancel.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "can't listen for exit signal");
            return;
        }

        warn!("exit signal detected");
        debug!("notifying exit");
        cancel2.cancel();
    });

    cancel
}

/// How client commands find the daemon
#[derive(Debug, Clone, clap::Args)]
pub struct SocketArgs {
    /// Path of the daemon socket, defaults to $STAKELEDGER_NODE_SOCKET_PATH
    #[arg(long, value_name = "SOCKET_PATH")]
    pub socket_path: Option<PathBuf>,
}

impl SocketArgs {
    pub async fn connect(&self) -> miette::Result<Client> {
        let path = resolve_socket_path(self.socket_path.clone()).map_err(Error::from)?;

        Client::connect(&path)
            .await
            .map_err(Error::from)
            .context("connecting to daemon")
    }
}

pub fn retry_policy(config: &crate::Config) -> RetryPolicy {
    RetryPolicy::from(&config.retries)
}

pub fn print_json(value: &impl Serialize) -> miette::Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");

    Ok(())
}
