//! Framed TCP connection to the registration server.
//!
//! [`TcpClient`] owns at most one connection and moves whole [`Message`]s
//! over it; [`FrameCodec`] does the framing, so a frame is always written
//! completely and read completely, however the bytes are split on the wire.
//!
//! ```text
//! register_tag ──> TcpClient ──(Framed<TcpStream, FrameCodec>)──> server
//!                    connect ─ send ─ recv ─ close
//! ```
//!
//! Every network wait (connect, send, recv) is bounded by
//! [`TcpClientConfig::timeout`]. Nothing is retried at this level.
//!
//! The server hanging up, cleanly or mid-frame, is
//! [`TcpClientError::ConnectionLost`]. Bytes that are not a valid frame are
//! [`TcpClientError::Protocol`].

use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tagbridge_core::constants::{DEFAULT_REGISTRATION_TIMEOUT_MS, DEFAULT_SERVER_PORT};
use tagbridge_protocol::{FrameCodec, Message};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

/// Bound on each step of closing a connection.
const CLOSE_STEP_TIMEOUT: Duration = Duration::from_millis(500);

/// Where the registration server is and how long to wait for it.
///
/// ```
/// use std::time::Duration;
/// use tagbridge_network::TcpClientConfig;
///
/// let config = TcpClientConfig::new("192.168.1.10", 7777).with_timeout(Duration::from_secs(2));
/// assert_eq!(config.server_addr(), "192.168.1.10:7777");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpClientConfig {
    pub host: String,
    pub port: u16,

    /// Applies separately to connect, each send and each recv.
    pub timeout: Duration,
}

impl TcpClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_millis(DEFAULT_REGISTRATION_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for TcpClientConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", DEFAULT_SERVER_PORT)
    }
}

#[derive(Debug, Error)]
pub enum TcpClientError {
    /// `send`/`recv` called without an open connection.
    #[error("No open connection")]
    NotConnected,

    #[error("Connect timed out after {0} ms")]
    ConnectionTimeout(u64),

    #[error("No response within {0} ms")]
    ReadTimeout(u64),

    #[error("Send did not complete within {0} ms")]
    WriteTimeout(u64),

    /// The server closed the connection before a whole frame arrived.
    #[error("Server hung up: {0}")]
    ConnectionLost(String),

    /// Bad magic, oversized frame, or a socket error seen by the codec.
    #[error("Frame error: {0}")]
    Protocol(#[from] tagbridge_core::Error),

    /// Connect failed (refused, unreachable, unresolvable host).
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which wait ran out, so an elapsed timer maps to the right error.
#[derive(Debug, Clone, Copy)]
enum Step {
    Connect,
    Send,
    Recv,
}

impl Step {
    fn timed_out(self, ms: u64) -> TcpClientError {
        match self {
            Step::Connect => TcpClientError::ConnectionTimeout(ms),
            Step::Send => TcpClientError::WriteTimeout(ms),
            Step::Recv => TcpClientError::ReadTimeout(ms),
        }
    }
}

/// Run `operation`, failing with the step's timeout error if it does not
/// finish within the configured timeout.
async fn within<F: Future>(
    config: &TcpClientConfig,
    step: Step,
    operation: F,
) -> Result<F::Output, TcpClientError> {
    tokio::time::timeout(config.timeout, operation)
        .await
        .map_err(|_| {
            let ms = config.timeout_ms();
            warn!(?step, timeout_ms = ms, server = %config.server_addr(), "Timed out");
            step.timed_out(ms)
        })
}

/// One framed connection to the registration server.
///
/// ```no_run
/// use tagbridge_network::{TcpClient, TcpClientConfig};
/// use tagbridge_protocol::{Message, MessageType};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = TcpClient::new(TcpClientConfig::default());
/// client.connect().await?;
///
/// client.send(Message::new(MessageType::NfcRegister, vec![1, 0xAB, 2, 1])?).await?;
/// let reply = client.recv().await?;
/// println!("{} bytes back", reply.payload_len());
///
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct TcpClient {
    config: TcpClientConfig,
    framed: Option<Framed<TcpStream, FrameCodec>>,
}

impl TcpClient {
    /// Client for `config`; nothing is opened until [`connect`](Self::connect).
    ///
    /// ```
    /// use tagbridge_network::{TcpClient, TcpClientConfig};
    ///
    /// assert!(!TcpClient::new(TcpClientConfig::default()).is_connected());
    /// ```
    pub fn new(config: TcpClientConfig) -> Self {
        Self {
            config,
            framed: None,
        }
    }

    /// Open the connection. Replaces any connection already open.
    ///
    /// # Errors
    ///
    /// [`TcpClientError::ConnectionTimeout`] if the server does not accept
    /// in time, [`TcpClientError::Io`] if it refuses or cannot be resolved.
    pub async fn connect(&mut self) -> Result<(), TcpClientError> {
        let server = self.config.server_addr();
        debug!(%server, "Connecting");

        let connecting = TcpStream::connect((self.config.host.as_str(), self.config.port));
        let stream = within(&self.config, Step::Connect, connecting).await?.map_err(|e| {
            warn!(%server, error = %e, "Connect failed");
            e
        })?;

        // Frames are a few bytes; send them as soon as they are written
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "TCP_NODELAY not set");
        }

        info!(%server, "Connected");
        self.framed = Some(Framed::new(stream, FrameCodec::new()));
        Ok(())
    }

    /// Write one whole frame.
    ///
    /// # Errors
    ///
    /// [`TcpClientError::NotConnected`], [`TcpClientError::WriteTimeout`],
    /// or [`TcpClientError::Protocol`] if encoding or the socket write fails.
    pub async fn send(&mut self, message: Message) -> Result<(), TcpClientError> {
        trace!(message_type = %message.message_type, len = message.payload_len(), "send");

        let framed = self.framed.as_mut().ok_or(TcpClientError::NotConnected)?;
        within(&self.config, Step::Send, framed.send(message)).await??;
        Ok(())
    }

    /// Read one whole frame.
    ///
    /// # Errors
    ///
    /// [`TcpClientError::NotConnected`], [`TcpClientError::ReadTimeout`],
    /// [`TcpClientError::ConnectionLost`] if the server hangs up before a
    /// complete frame, [`TcpClientError::Protocol`] for a bad frame.
    pub async fn recv(&mut self) -> Result<Message, TcpClientError> {
        let framed = self.framed.as_mut().ok_or(TcpClientError::NotConnected)?;

        match within(&self.config, Step::Recv, framed.next()).await? {
            Some(Ok(message)) => {
                trace!(message_type = %message.message_type, len = message.payload_len(), "recv");
                Ok(message)
            }
            Some(Err(tagbridge_core::Error::ConnectionClosed { expected, received })) => {
                warn!(expected, received, "Server hung up mid-frame");
                Err(TcpClientError::ConnectionLost(format!(
                    "closed after {received} of {expected} frame bytes"
                )))
            }
            Some(Err(e)) => {
                warn!(error = %e, "Bad frame from server");
                Err(e.into())
            }
            None => {
                warn!("Server hung up before replying");
                Err(TcpClientError::ConnectionLost("no reply".to_string()))
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Flush and shut down the connection, if one is open.
    ///
    /// Safe to call repeatedly. Each step is bounded, and failures only get
    /// logged: the connection is released either way.
    ///
    /// # Errors
    ///
    /// None at present; the `Result` leaves room for callers to `?` it.
    pub async fn close(&mut self) -> Result<(), TcpClientError> {
        let Some(mut framed) = self.framed.take() else {
            return Ok(());
        };

        match tokio::time::timeout(CLOSE_STEP_TIMEOUT, framed.flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Flush on close failed"),
            Err(_) => warn!("Flush on close timed out"),
        }

        let mut stream = framed.into_inner();
        match tokio::time::timeout(CLOSE_STEP_TIMEOUT, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Shutdown on close failed"),
            Err(_) => warn!("Shutdown on close timed out"),
        }

        debug!(server = %self.config.server_addr(), "Disconnected");
        Ok(())
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        if self.framed.is_some() {
            debug!("TcpClient dropped with an open connection");
        }
    }
}
