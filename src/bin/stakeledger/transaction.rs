use std::path::{Path, PathBuf};

use miette::{bail, Context as _, IntoDiagnostic};

use stakeledger::core::{Address, Certificate, CredentialId, Transaction, TxOutput, Withdrawal};
use stakeledger::ledger::balance_fee;

use crate::common::{print_json, SocketArgs};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Submit a transaction file to the daemon
    Submit {
        #[command(flatten)]
        socket: SocketArgs,

        #[arg(long, value_name = "FILE")]
        tx_file: PathBuf,
    },

    /// Minimum fee the daemon would require for a transaction file
    CalculateMinFee {
        #[command(flatten)]
        socket: SocketArgs,

        #[arg(long, value_name = "FILE")]
        tx_file: PathBuf,
    },

    /// Assemble a transaction with a balanced fee
    Build(BuildArgs),
}

#[derive(Debug, clap::Args)]
pub struct BuildArgs {
    #[command(flatten)]
    socket: SocketArgs,

    /// Address paying fees and deposits
    #[arg(long)]
    source: Address,

    /// Output in the form ADDRESS+AMOUNT
    #[arg(long, value_parser = parse_tx_out)]
    tx_out: Vec<(Address, i64)>,

    /// Withdrawal in the form CREDENTIAL+AMOUNT
    #[arg(long, value_parser = parse_withdrawal)]
    withdrawal: Vec<(CredentialId, i64)>,

    /// JSON file holding one certificate, may be repeated
    #[arg(long, value_name = "FILE")]
    certificate_file: Vec<PathBuf>,

    /// Validate the result against the current ledger before writing it
    #[arg(long)]
    check: bool,

    #[arg(long, value_name = "FILE")]
    out_file: PathBuf,
}

fn split_amount(s: &str) -> miette::Result<(&str, i64)> {
    let Some((key, amount)) = s.rsplit_once('+') else {
        bail!("expected KEY+AMOUNT, got `{s}`")
    };

    let amount = amount
        .parse::<i64>()
        .into_diagnostic()
        .context("invalid amount")?;

    Ok((key, amount))
}

fn parse_tx_out(s: &str) -> miette::Result<(Address, i64)> {
    let (address, amount) = split_amount(s)?;
    let address = address.parse().into_diagnostic().context("invalid address")?;

    Ok((address, amount))
}

fn parse_withdrawal(s: &str) -> miette::Result<(CredentialId, i64)> {
    let (credential, amount) = split_amount(s)?;
    let credential = credential
        .parse()
        .into_diagnostic()
        .context("invalid stake credential")?;

    Ok((credential, amount))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> miette::Result<T> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .with_context(|| format!("reading {}", path.display()))?;

    serde_json::from_str(&content)
        .into_diagnostic()
        .with_context(|| format!("parsing {}", path.display()))
}

async fn build(args: &BuildArgs) -> miette::Result<()> {
    let client = args.socket.connect().await?;

    let mut tx = Transaction::new(args.source.clone());

    tx.outputs = args
        .tx_out
        .iter()
        .map(|(address, amount)| TxOutput {
            address: address.clone(),
            amount: *amount,
        })
        .collect();

    tx.withdrawals = args
        .withdrawal
        .iter()
        .map(|(credential, amount)| Withdrawal {
            credential: *credential,
            amount: *amount,
        })
        .collect();

    tx.certificates = args
        .certificate_file
        .iter()
        .map(|path| read_json::<Certificate>(path))
        .collect::<miette::Result<_>>()?;

    let pparams = client.protocol_parameters().await.into_diagnostic()?;
    let fee = balance_fee(&pparams, &mut tx);

    if args.check {
        client
            .evaluate(tx.clone())
            .await
            .into_diagnostic()
            .context("transaction would be rejected")?;
    }

    let json = serde_json::to_string_pretty(&tx).into_diagnostic()?;
    std::fs::write(&args.out_file, json).into_diagnostic()?;

    eprintln!("Estimated transaction fee: {fee} lovelace");

    Ok(())
}

#[tokio::main]
pub async fn run(_config: &super::Config, command: &Command) -> miette::Result<()> {
    match command {
        Command::Submit { socket, tx_file } => {
            let tx: Transaction = read_json(tx_file)?;
            let client = socket.connect().await?;

            print_json(&client.submit(tx).await.into_diagnostic()?)
        }
        Command::CalculateMinFee { socket, tx_file } => {
            let tx: Transaction = read_json(tx_file)?;
            let client = socket.connect().await?;

            let fee = client.min_fee(tx).await.into_diagnostic()?;
            println!("{fee} Lovelace");

            Ok(())
        }
        Command::Build(args) => build(args).await,
    }
}
