use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use tagbridge_core::constants::{
    DEFAULT_REGISTRATION_TIMEOUT_MS, DEFAULT_SERIAL_BAUD, DEFAULT_SERVER_PORT,
};
use tagbridge_core::{Rarity, UnitKind};
use tagbridge_network::TcpClientConfig;

/// Host tools for the NFC tag station.
#[derive(Debug, Parser)]
#[command(name = "tagbridge")]
#[command(version, about = "Host tools for the NFC tag station")]
pub struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register every scanned tag on the game server
    Register(RegisterArgs),

    /// Print the text payload of every tag placed on the station
    Payloads(InputArgs),

    /// Run the reader station against scripted mock readers
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Event source: serial device, capture file, `-` for stdin, or `auto`
    #[arg(short, long, default_value = "auto")]
    pub input: String,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_SERIAL_BAUD)]
    pub baud: u32,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Unit kind, by name or type index (mushroom, goblin, cat, devil, fish, lizard)
    #[arg(short = 't', long = "type", value_name = "KIND")]
    pub kind: UnitKind,

    /// Rarity, by name or number (common, rare, legendary)
    #[arg(short, long, default_value = "common")]
    pub rarity: Rarity,

    /// Registration server host
    #[arg(short, long, env = "NFC_SERVER", default_value = "127.0.0.1")]
    pub server: String,

    /// Registration server port
    #[arg(short, long, env = "NFC_PORT", default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Connect and read timeout per registration, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REGISTRATION_TIMEOUT_MS)]
    pub timeout_ms: u64,
}

impl RegisterArgs {
    pub fn client_config(&self) -> TcpClientConfig {
        TcpClientConfig::new(self.server.clone(), self.port)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Scenario file (JSON)
    pub scenario: PathBuf,

    /// Poll cycles to run; overrides the scenario's own count
    #[arg(short = 'n', long)]
    pub cycles: Option<u64>,
}
