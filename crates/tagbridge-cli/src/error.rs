use std::path::PathBuf;

use tagbridge_station::StationError;
use thiserror::Error;

/// Failures that happen before any work starts.
///
/// The binary exits with status 2 for these, 1 for everything else.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Cannot open input {path}: {source}")]
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot open serial port {path}: {source}")]
    OpenSerial {
        path: String,
        source: serialport::Error,
    },

    #[error("No serial port found (looked for /dev/ttyACM* and /dev/cu.usbmodem*)")]
    NoSerialPort,

    #[error("Cannot read scenario {path}: {source}")]
    ReadScenario {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    ScenarioFormat(#[from] serde_json::Error),

    #[error("Invalid station configuration: {0}")]
    Station(#[from] StationError),
}
