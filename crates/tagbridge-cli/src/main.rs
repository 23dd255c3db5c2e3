//! `tagbridge`: host tools for the NFC tag station.
//!
//! # Usage
//!
//! ```bash
//! # Register every tag scanned on the station as a rare cat
//! NFC_SERVER=game.example.org tagbridge register --type cat --rarity rare
//!
//! # Same, replaying a captured event stream
//! tagbridge register -t goblin -i capture.log
//!
//! # Print tag payloads as they are placed on the readers
//! tagbridge payloads -i /dev/ttyACM0
//!
//! # Run the station against scripted mock readers
//! tagbridge simulate demos/station.json
//! ```
//!
//! Diagnostics go to stderr through `tracing`; results and the event stream
//! go to stdout. Exit status is 2 when the input, scenario or configuration
//! cannot be used, 1 for any other failure.

mod cli;
mod error;
mod input;
mod payloads;
mod register;
mod simulate;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::SetupError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Register(args) => register::run(args).await,
        Command::Payloads(args) => payloads::run(args).await,
        Command::Simulate(args) => simulate::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_status(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<SetupError>().is_some() {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let setup = anyhow::Error::from(SetupError::NoSerialPort);
        assert_eq!(exit_status(&setup), 2);

        let other = anyhow::anyhow!("stdout closed");
        assert_eq!(exit_status(&other), 1);
    }
}
