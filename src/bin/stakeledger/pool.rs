use std::path::PathBuf;

use miette::{Context as _, IntoDiagnostic};

use stakeledger::core::PoolId;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum IdFormat {
    Bech32,
    Hex,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Derive the pool id from a hex-encoded cold verification key file
    Id {
        #[arg(long, value_name = "FILE")]
        cold_verification_key_file: PathBuf,

        #[arg(long, value_enum, default_value = "bech32")]
        output_format: IdFormat,
    },
}

pub fn run(command: &Command) -> miette::Result<()> {
    match command {
        Command::Id {
            cold_verification_key_file,
            output_format,
        } => {
            let content = std::fs::read_to_string(cold_verification_key_file)
                .into_diagnostic()
                .context("reading cold verification key")?;

            let key = hex::decode(content.trim())
                .into_diagnostic()
                .context("cold verification key is not hex")?;

            let pool_id = PoolId::from_cold_key(&key);

            match output_format {
                IdFormat::Bech32 => println!("{pool_id}"),
                IdFormat::Hex => println!("{}", pool_id.to_hex()),
            }

            Ok(())
        }
    }
}
