use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use futures_util::{SinkExt as _, StreamExt as _};
use stakeledger_core::{
    Address, CredentialId, ErrorCode, Lovelace, PoolId, PoolState, Pots, ProtocolParams,
    ProtocolState, StakeAddressInfo, StakeDistribution, Transaction, TxRecord,
};
use stakeledger_ledger::EpochSummary;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

use crate::protocol::{Reply, Request, Response, MAX_LINE_LENGTH};

/// Environment variable consulted when no socket path is given explicitly
pub const SOCKET_PATH_ENV: &str = "STAKELEDGER_NODE_SOCKET_PATH";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Missing: --socket-path SOCKET_PATH")]
    MissingSocketPath,

    #[error("failed to connect to {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out waiting for {what} after {attempts} attempts")]
    Timeout { what: String, attempts: usize },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{message}")]
    Rejected { code: ErrorCode, message: String },
}

impl ClientError {
    fn protocol(error: impl std::fmt::Display) -> Self {
        Self::Protocol(error.to_string())
    }
}

/// Picks the socket path from the flag, then from the environment
///
/// An empty environment value counts as unset.
pub fn resolve_socket_path_from(
    explicit: Option<PathBuf>,
    env: Option<OsString>,
) -> Result<PathBuf, ClientError> {
    explicit
        .or_else(|| env.filter(|x| !x.is_empty()).map(PathBuf::from))
        .ok_or(ClientError::MissingSocketPath)
}

pub fn resolve_socket_path(explicit: Option<PathBuf>) -> Result<PathBuf, ClientError> {
    resolve_socket_path_from(explicit, std::env::var_os(SOCKET_PATH_ENV))
}

/// A handle to a running daemon
///
/// Every call opens its own connection, so handles are cheap to clone and can
/// be moved into polling closures.
#[derive(Debug, Clone)]
pub struct Client {
    socket_path: PathBuf,
}

impl Client {
    /// Checks that the daemon is reachable at `socket_path`
    pub async fn connect(socket_path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let client = Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        };

        client.open().await?;

        Ok(client)
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn open(&self) -> Result<Framed<UnixStream, LinesCodec>, ClientError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| ClientError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        Ok(Framed::new(
            stream,
            LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        ))
    }

    pub async fn call(&self, request: &Request) -> Result<Reply, ClientError> {
        let mut framed = self.open().await?;

        let line = serde_json::to_string(request).map_err(ClientError::protocol)?;
        framed.send(line).await.map_err(ClientError::protocol)?;

        let line = framed
            .next()
            .await
            .ok_or_else(|| ClientError::Protocol("connection closed before response".into()))?
            .map_err(ClientError::protocol)?;

        debug!(len = line.len(), "received response");

        match serde_json::from_str(&line).map_err(ClientError::protocol)? {
            Response::Ok(reply) => Ok(reply),
            Response::Rejected(rejection) => Err(ClientError::Rejected {
                code: rejection.code,
                message: rejection.message,
            }),
            Response::BadRequest(message) => Err(ClientError::Protocol(message)),
        }
    }

    pub async fn protocol_parameters(&self) -> Result<ProtocolParams, ClientError> {
        match self.call(&Request::ProtocolParameters).await? {
            Reply::ProtocolParameters(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn protocol_state(&self) -> Result<ProtocolState, ClientError> {
        match self.call(&Request::ProtocolState).await? {
            Reply::ProtocolState(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn stake_distribution(&self) -> Result<StakeDistribution, ClientError> {
        match self.call(&Request::StakeDistribution).await? {
            Reply::StakeDistribution(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn pool_state(&self, pool_id: PoolId) -> Result<Option<PoolState>, ClientError> {
        match self.call(&Request::PoolState { pool_id }).await? {
            Reply::PoolState(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn stake_address_info(
        &self,
        credential: CredentialId,
    ) -> Result<Option<StakeAddressInfo>, ClientError> {
        match self.call(&Request::StakeAddressInfo { credential }).await? {
            Reply::StakeAddressInfo(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn balance(&self, address: Address) -> Result<Lovelace, ClientError> {
        match self.call(&Request::Balance { address }).await? {
            Reply::Balance(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn pots(&self) -> Result<Pots, ClientError> {
        match self.call(&Request::Pots).await? {
            Reply::Pots(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn min_fee(&self, tx: Transaction) -> Result<Lovelace, ClientError> {
        match self.call(&Request::MinFee { tx }).await? {
            Reply::MinFee(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn evaluate(&self, tx: Transaction) -> Result<TxRecord, ClientError> {
        match self.call(&Request::Evaluate { tx }).await? {
            Reply::TxRecord(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn submit(&self, tx: Transaction) -> Result<TxRecord, ClientError> {
        match self.call(&Request::Submit { tx }).await? {
            Reply::TxRecord(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }

    pub async fn advance_epoch(&self) -> Result<EpochSummary, ClientError> {
        match self.call(&Request::AdvanceEpoch).await? {
            Reply::EpochSummary(x) => Ok(x),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(reply: Reply) -> ClientError {
    ClientError::Protocol(format!("unexpected reply {reply:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_env() {
        let path = resolve_socket_path_from(Some("flag.socket".into()), Some("env.socket".into()));
        assert_eq!(path.unwrap(), PathBuf::from("flag.socket"));
    }

    #[test]
    fn empty_env_counts_as_missing() {
        let err = resolve_socket_path_from(None, Some(OsString::new())).unwrap_err();
        assert!(matches!(err, ClientError::MissingSocketPath));
    }
}
