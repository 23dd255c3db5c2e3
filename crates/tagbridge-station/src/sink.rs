//! Event sinks.
//!
//! The manager hands every event to an [`EventSink`]. The station binary
//! writes them as lines to stdout; tests collect them in a `Vec`; a host
//! process in the same runtime can take them from a channel.

#![allow(async_fn_in_trait)]

use tagbridge_core::TagEvent;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Result, StationError};

/// Destination for station events.
pub trait EventSink {
    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the output is gone; the station stops.
    async fn emit(&mut self, event: TagEvent) -> Result<()>;
}

impl EventSink for Vec<TagEvent> {
    async fn emit(&mut self, event: TagEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

impl EventSink for mpsc::Sender<TagEvent> {
    async fn emit(&mut self, event: TagEvent) -> Result<()> {
        self.send(event).await.map_err(|_| StationError::SinkClosed)
    }
}

/// Writes each event as one newline-terminated line and flushes it.
///
/// # Examples
///
/// ```
/// use tagbridge_core::{SlotId, TagEvent};
/// use tagbridge_station::{EventSink, LineSink};
///
/// #[tokio::main]
/// async fn main() -> tagbridge_station::Result<()> {
///     let mut sink = LineSink::new(Vec::new());
///     sink.emit(TagEvent::Removed { slot: SlotId::from_index(0) }).await?;
///     assert_eq!(sink.into_inner(), b"REMOVED:1\n");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct LineSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin> EventSink for LineSink<W> {
    async fn emit(&mut self, event: TagEvent) -> Result<()> {
        let line = format!("{event}\n");
        self.writer.write_all(line.as_bytes()).await?;
        // Consumers read line by line, so each event goes out on its own
        self.writer.flush().await?;
        Ok(())
    }
}
