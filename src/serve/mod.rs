use futures_util::{SinkExt as _, StreamExt as _};
use stakeledger_core::config::ServeConfig;
use stakeledger_ledger::SharedLedger;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use crate::prelude::*;
use crate::protocol::{Response, MAX_LINE_LENGTH};

mod handler;

pub use handler::handle;

fn respond_to(line: &str, ledger: &SharedLedger) -> Response {
    match serde_json::from_str(line) {
        Ok(request) => handle(ledger, request),
        Err(err) => {
            warn!(%err, "malformed request");
            Response::BadRequest(err.to_string())
        }
    }
}

async fn handle_session(
    stream: UnixStream,
    ledger: SharedLedger,
    cancel: CancellationToken,
) -> Result<(), Error> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    loop {
        let line = tokio::select! {
            line = framed.next() => line,
            _ = cancel.cancelled() => break,
        };

        let Some(line) = line else {
            debug!("client disconnected");
            break;
        };

        let response = match line {
            Ok(line) => respond_to(&line, &ledger),
            Err(err) => Response::BadRequest(err.to_string()),
        };

        let line = serde_json::to_string(&response).map_err(Error::server)?;
        framed.send(line).await.map_err(Error::server)?;
    }

    Ok(())
}

async fn run_session(stream: UnixStream, ledger: SharedLedger, cancel: CancellationToken) {
    if let Err(err) = handle_session(stream, ledger, cancel).await {
        warn!(%err, "client session failed");
    }
}

async fn accept_client_connections(
    config: &ServeConfig,
    ledger: SharedLedger,
    tasks: &TaskTracker,
    cancel: CancellationToken,
) -> Result<(), Error> {
    if config.listen_path.exists() {
        warn!(path = %config.listen_path.display(), "removing stale socket file");
        std::fs::remove_file(&config.listen_path)?;
    }

    let listener = UnixListener::bind(&config.listen_path).map_err(Error::server)?;
    info!(path = %config.listen_path.display(), "socket is listening for clients");

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tasks.spawn(run_session(stream, ledger.clone(), cancel.clone()));
                debug!(connections = tasks.len(), "active connections changed");
            }
            Err(error) => {
                warn!(%error, "error on incoming connection");
            }
        }
    }
}

/// Serves ledger requests on a Unix socket until `cancel` fires
#[instrument(skip_all)]
pub async fn serve(
    config: ServeConfig,
    ledger: SharedLedger,
    cancel: CancellationToken,
) -> Result<(), Error> {
    let tasks = TaskTracker::new();

    tokio::select! {
        res = accept_client_connections(&config, ledger, &tasks, cancel.clone()) => {
            res?;
        },
        _ = cancel.cancelled() => {
            warn!("exit requested");
        }
    }

    // removing socket file so that it's free for next run
    debug!("removing socket file");
    std::fs::remove_file(&config.listen_path)?;

    // without an explicit close the wait below never returns
    tasks.close();

    debug!("waiting for sessions to finish");
    tasks.wait().await;

    info!("graceful shutdown finished");

    Ok(())
}
