//! `tagbridge register`: register every scanned tag on the game server.
//!
//! Each `UID:` line from the station triggers one registration round trip
//! with the kind and rarity chosen on the command line. Results are printed
//! to stdout as they happen; all other station output goes to the log.

use std::io::Write;

use tagbridge_core::{Rarity, TagEvent, UnitKind};
use tagbridge_network::{TcpClientConfig, register_tag};
use tagbridge_protocol::RegistrationRequest;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::RegisterArgs;
use crate::input::InputSource;

/// What every scanned tag is registered as, and where.
#[derive(Debug, Clone)]
pub struct RegisterOptions {
    pub client: TcpClientConfig,
    pub kind: UnitKind,
    pub rarity: Rarity,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSummary {
    pub registered: usize,
    pub failed: usize,
}

pub async fn run(args: RegisterArgs) -> anyhow::Result<()> {
    let options = RegisterOptions {
        client: args.client_config(),
        kind: args.kind,
        rarity: args.rarity,
    };
    let mut lines = InputSource::parse(&args.input.input)?.open(args.input.baud)?;

    info!(
        kind = %options.kind,
        type_index = options.kind.to_u8(),
        rarity = %options.rarity,
        server = %options.client.server_addr(),
        "Scan a tag on any reader"
    );

    let mut stdout = std::io::stdout();
    let summary = register_from_lines(&mut lines, &options, &mut stdout).await?;

    info!(
        registered = summary.registered,
        failed = summary.failed,
        "Input ended"
    );
    Ok(())
}

/// Register the tag of every `UID:` line until the line source closes.
///
/// A failed registration is reported and the loop goes on with the next
/// tag; only a failure to write the report ends it.
pub async fn register_from_lines<W: Write>(
    lines: &mut mpsc::Receiver<String>,
    options: &RegisterOptions,
    out: &mut W,
) -> anyhow::Result<RegisterSummary> {
    let mut summary = RegisterSummary::default();

    while let Some(line) = lines.recv().await {
        let (slot, uid) = match line.parse::<TagEvent>() {
            Ok(TagEvent::Uid { slot, uid }) => (slot, uid),
            Ok(event) => {
                debug!(%event, "Station event");
                continue;
            }
            Err(e) if line.starts_with("UID:") => {
                warn!(%line, error = %e, "Malformed UID line");
                continue;
            }
            Err(_) => {
                info!("[station] {}", line);
                continue;
            }
        };

        writeln!(out, "Reader {slot}: UID {uid} ({} bytes)", uid.len())?;

        let request = RegistrationRequest::new(uid.clone(), options.kind, options.rarity);
        match register_tag(&options.client, request).await {
            Ok(_) => {
                summary.registered += 1;
                writeln!(
                    out,
                    "SUCCESS: {uid} registered as {} ({})",
                    options.kind, options.rarity
                )?;
            }
            Err(e) => {
                summary.failed += 1;
                writeln!(out, "FAILED: {uid} ({e})")?;
            }
        }
        out.flush()?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use std::time::Duration;
    use tagbridge_protocol::{FrameCodec, Message, MessageType};
    use tokio::net::TcpListener;
    use tokio_util::codec::Framed;

    /// Server that accepts tags whose UID starts with `0x04` and rejects
    /// the rest with status 1.
    async fn game_server() -> TcpClientConfig {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let mut framed = Framed::new(stream, FrameCodec::new());
                let Some(Ok(request)) = framed.next().await else {
                    continue;
                };
                let request = RegistrationRequest::parse(&request.payload).unwrap();
                let status = if request.uid.as_bytes()[0] == 0x04 { 0 } else { 1 };

                let mut payload = vec![request.uid.len() as u8];
                payload.extend_from_slice(request.uid.as_bytes());
                payload.extend_from_slice(&[status, request.type_index, request.rarity]);
                let reply = Message::new(MessageType::NfcData, payload).unwrap();
                let _ = framed.send(reply).await;
            }
        });

        TcpClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(2))
    }

    fn feed(lines: &[&str]) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            tx.try_send(line.to_string()).unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn test_registers_uid_lines_only() {
        let options = RegisterOptions {
            client: game_server().await,
            kind: UnitKind::Cat,
            rarity: Rarity::Rare,
        };
        let mut lines = feed(&[
            "Reader 1 (GP5): OK",
            "UID:1:04A3B2C1D2E3F4",
            "PAYLOAD:Cat",
            "UID:2:ABCDEF01",
            "REMOVED:1",
        ]);

        let mut out = Vec::new();
        let summary = register_from_lines(&mut lines, &options, &mut out)
            .await
            .unwrap();

        assert_eq!(
            summary,
            RegisterSummary {
                registered: 1,
                failed: 1
            }
        );
        let out = String::from_utf8(out).unwrap();
        let printed: Vec<&str> = out.lines().collect();
        assert_eq!(printed[0], "Reader 1: UID 04A3B2C1D2E3F4 (7 bytes)");
        assert_eq!(printed[1], "SUCCESS: 04A3B2C1D2E3F4 registered as cat (rare)");
        assert_eq!(printed[2], "Reader 2: UID ABCDEF01 (4 bytes)");
        assert!(printed[3].starts_with("FAILED: ABCDEF01 ("), "{}", printed[3]);
        assert_eq!(printed.len(), 4);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_each_tag() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let options = RegisterOptions {
            client: TcpClientConfig::new("127.0.0.1", port)
                .with_timeout(Duration::from_millis(500)),
            kind: UnitKind::Goblin,
            rarity: Rarity::Common,
        };
        let mut lines = feed(&["UID:1:04A3B2C1", "UID:3:04A3B2C2"]);

        let mut out = Vec::new();
        let summary = register_from_lines(&mut lines, &options, &mut out)
            .await
            .unwrap();

        assert_eq!(summary.registered, 0);
        assert_eq!(summary.failed, 2);
    }

    #[tokio::test]
    async fn test_malformed_uid_line_is_skipped() {
        let options = RegisterOptions {
            client: game_server().await,
            kind: UnitKind::Fish,
            rarity: Rarity::Legendary,
        };
        let mut lines = feed(&["UID:1:not-hex", "UID:9"]);

        let mut out = Vec::new();
        let summary = register_from_lines(&mut lines, &options, &mut out)
            .await
            .unwrap();

        assert_eq!(summary, RegisterSummary::default());
        assert!(out.is_empty());
    }
}
