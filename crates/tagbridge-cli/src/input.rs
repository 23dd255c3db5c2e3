//! Event line sources.
//!
//! The station writes its event stream to a USB serial port; the host tools
//! can also replay a captured stream from a file or read it from stdin.
//! Whatever the source, lines arrive on an mpsc channel, trimmed, with
//! invalid UTF-8 replaced and blank lines dropped. The channel closes when
//! the source ends.

use std::io::{BufRead, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SetupError;

/// Lines buffered between the reader and the consumer.
const LINE_BUFFER: usize = 64;

/// Device name prefixes the station enumerates as.
const SERIAL_PREFIXES: [&str; 2] = ["ttyACM", "cu.usbmodem"];

/// Read timeout on the serial port, so the reader thread notices shutdown.
const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
    Serial(String),
}

impl InputSource {
    /// Interpret an `--input` argument.
    ///
    /// `-` is stdin, `auto` is the first station serial port found, device
    /// paths (`/dev/...`, `COMn`) are serial ports, anything else is a file.
    pub fn parse(arg: &str) -> Result<Self, SetupError> {
        match arg {
            "-" => Ok(InputSource::Stdin),
            "auto" => find_serial_port()
                .map(|path| InputSource::Serial(path.to_string_lossy().into_owned()))
                .ok_or(SetupError::NoSerialPort),
            _ if is_device_path(arg) => Ok(InputSource::Serial(arg.to_string())),
            _ => Ok(InputSource::File(PathBuf::from(arg))),
        }
    }

    /// Open the source and start forwarding its lines.
    ///
    /// Opening happens here, synchronously, so a missing file or port is
    /// reported before anything else runs.
    pub fn open(self, baud: u32) -> Result<mpsc::Receiver<String>, SetupError> {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);

        match self {
            InputSource::Stdin => {
                info!("Reading events from stdin");
                tokio::spawn(forward_lines(BufReader::new(tokio::io::stdin()), tx));
            }
            InputSource::File(path) => {
                let file = std::fs::File::open(&path)
                    .map_err(|source| SetupError::OpenInput { path: path.clone(), source })?;
                info!(path = %path.display(), "Reading events from file");
                let file = tokio::fs::File::from_std(file);
                tokio::spawn(forward_lines(BufReader::new(file), tx));
            }
            InputSource::Serial(path) => {
                let port = serialport::new(&path, baud)
                    .timeout(SERIAL_READ_TIMEOUT)
                    .open()
                    .map_err(|source| SetupError::OpenSerial {
                        path: path.clone(),
                        source,
                    })?;
                info!(%path, baud, "Reading events from serial port");
                std::thread::spawn(move || forward_serial(std::io::BufReader::new(port), tx));
            }
        }

        Ok(rx)
    }
}

fn is_device_path(arg: &str) -> bool {
    arg.starts_with("/dev/")
        || arg
            .strip_prefix("COM")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// First station serial port under `/dev`, in name order.
fn find_serial_port() -> Option<PathBuf> {
    let mut ports: Vec<PathBuf> = std::fs::read_dir("/dev")
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_station_port(path))
        .collect();
    ports.sort();
    ports.into_iter().next()
}

fn is_station_port(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| SERIAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix)))
}

/// Turn raw line bytes into a trimmed line, or `None` if it is blank.
fn clean_line(raw: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    (!line.is_empty()).then(|| line.to_string())
}

async fn forward_lines<R: AsyncBufRead + Unpin>(mut reader: R, tx: mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if let Some(line) = clean_line(&buf) {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Input read failed");
                break;
            }
        }
    }
    debug!("Input ended");
}

/// Blocking loop for serial ports, run on its own thread.
///
/// Read timeouts are not errors: the partial line stays in the buffer and
/// the next read continues it.
fn forward_serial<R: BufRead>(mut reader: R, tx: mpsc::Sender<String>) {
    let mut buf = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if let Some(line) = clean_line(&buf) {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                buf.clear();
            }
            Err(e) if e.kind() == ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!(error = %e, "Serial read failed");
                break;
            }
        }
    }
    debug!("Serial input ended");
}
