use miette::IntoDiagnostic;

use stakeledger::core::{Address, CredentialId, PoolId};

use crate::common::{print_json, SocketArgs};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Current protocol parameters
    ProtocolParameters(SocketArgs),

    /// Current epoch, last transaction and pending parameter update
    ProtocolState(SocketArgs),

    /// Delegators and stake per active pool
    StakeDistribution(SocketArgs),

    /// Registration state of a single pool
    PoolState {
        #[command(flatten)]
        socket: SocketArgs,

        /// Pool id, bech32 or hex
        #[arg(long)]
        pool_id: PoolId,
    },

    /// Registration, delegation and rewards of a stake credential
    StakeAddressInfo {
        #[command(flatten)]
        socket: SocketArgs,

        #[arg(long)]
        credential: CredentialId,
    },

    /// Spendable balance of an address
    Balance {
        #[command(flatten)]
        socket: SocketArgs,

        #[arg(long)]
        address: Address,
    },

    /// Reserves, treasury, deposits and collected fees
    Pots(SocketArgs),
}

#[tokio::main]
pub async fn run(_config: &super::Config, command: &Command) -> miette::Result<()> {
    match command {
        Command::ProtocolParameters(socket) => {
            let client = socket.connect().await?;
            print_json(&client.protocol_parameters().await.into_diagnostic()?)
        }
        Command::ProtocolState(socket) => {
            let client = socket.connect().await?;
            print_json(&client.protocol_state().await.into_diagnostic()?)
        }
        Command::StakeDistribution(socket) => {
            let client = socket.connect().await?;
            print_json(&client.stake_distribution().await.into_diagnostic()?)
        }
        Command::PoolState { socket, pool_id } => {
            let client = socket.connect().await?;
            print_json(&client.pool_state(*pool_id).await.into_diagnostic()?)
        }
        Command::StakeAddressInfo { socket, credential } => {
            let client = socket.connect().await?;
            print_json(&client.stake_address_info(*credential).await.into_diagnostic()?)
        }
        Command::Balance { socket, address } => {
            let client = socket.connect().await?;
            print_json(&client.balance(address.clone()).await.into_diagnostic()?)
        }
        Command::Pots(socket) => {
            let client = socket.connect().await?;
            print_json(&client.pots().await.into_diagnostic()?)
        }
    }
}
