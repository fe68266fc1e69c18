use miette::IntoDiagnostic;

use stakeledger::core::Epoch;
use stakeledger::poll::wait_for_epoch;

use crate::common::{print_json, retry_policy, SocketArgs};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Cross into the next epoch right away
    Advance(SocketArgs),

    /// Block until the daemon reaches the given epoch
    Wait {
        #[command(flatten)]
        socket: SocketArgs,

        #[arg(long)]
        target: Epoch,
    },
}

#[tokio::main]
pub async fn run(config: &super::Config, command: &Command) -> miette::Result<()> {
    match command {
        Command::Advance(socket) => {
            let client = socket.connect().await?;
            print_json(&client.advance_epoch().await.into_diagnostic()?)
        }
        Command::Wait { socket, target } => {
            let client = socket.connect().await?;
            let policy = retry_policy(config);

            let epoch = wait_for_epoch(&client, *target, &policy)
                .await
                .into_diagnostic()?;

            println!("{epoch}");
            Ok(())
        }
    }
}
