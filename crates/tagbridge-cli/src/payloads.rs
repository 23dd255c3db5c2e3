//! `tagbridge payloads`: forward tag payloads from the station to stdout.
//!
//! Only the text of `PAYLOAD:` lines is printed, one per line, so the output
//! can be piped into another program. Everything else the station says is
//! logged.

use std::io::Write;

use tagbridge_core::TagEvent;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::InputArgs;
use crate::input::InputSource;

pub async fn run(args: InputArgs) -> anyhow::Result<()> {
    let mut lines = InputSource::parse(&args.input)?.open(args.baud)?;
    info!("Waiting for NFC tags");

    let mut stdout = std::io::stdout();
    let forwarded = forward_payloads(&mut lines, &mut stdout).await?;

    info!(forwarded, "Input ended");
    Ok(())
}

/// Print each payload text until the line source closes.
///
/// Returns the number of payloads forwarded.
pub async fn forward_payloads<W: Write>(
    lines: &mut mpsc::Receiver<String>,
    out: &mut W,
) -> std::io::Result<usize> {
    let mut forwarded = 0;

    while let Some(line) = lines.recv().await {
        match line.parse::<TagEvent>() {
            Ok(TagEvent::Payload(text)) => {
                writeln!(out, "{text}")?;
                out.flush()?;
                forwarded += 1;
            }
            Ok(event) => debug!(%event, "Station event"),
            Err(_) => info!("[station] {}", line),
        }
    }

    Ok(forwarded)
}
