//! Tokio codec for registration protocol framing.
//!
//! This module provides a Tokio-compatible codec so that the registration
//! protocol can be spoken over any `AsyncRead + AsyncWrite` stream through
//! `tokio_util::codec::Framed`.
//!
//! # Overview
//!
//! - [`Decoder`]: waits for the 5-byte header, validates the magic, then
//!   waits for exactly `LENGTH` payload bytes. Short reads simply return
//!   `Ok(None)` until the rest arrives.
//! - [`Encoder<Message>`]: writes header and payload into the outgoing
//!   buffer as one frame; `Framed` keeps writing until the whole buffer is on
//!   the wire, so partial socket writes are retried transparently.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use tagbridge_protocol::{FrameCodec, Message, MessageType};
//!
//! # async fn example() -> tagbridge_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:7777").await?;
//! let mut framed = Framed::new(stream, FrameCodec::new());
//!
//! framed.send(Message::new(MessageType::NfcRegister, vec![4, 1, 2, 3, 4, 1, 0])?).await?;
//!
//! if let Some(Ok(response)) = framed.next().await {
//!     println!("Received {} ({} bytes)", response.message_type, response.payload_len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Decode errors are distinct so callers can tell them apart:
//! - `Error::BadMagic`: the peer is not speaking this protocol
//! - `Error::PayloadTooLarge`: declared length above the configured limit
//! - `Error::ConnectionClosed`: end of stream in the middle of a frame
//!
//! A clean end of stream between frames is not an error; the stream just
//! ends.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{FrameHeader, Message};
use tagbridge_core::{
    Error, Result,
    constants::{HEADER_SIZE, MAX_PAYLOAD_SIZE},
};

/// Tokio codec for registration protocol frames.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use tokio_util::codec::Decoder;
/// use tagbridge_protocol::{FrameCodec, MessageType};
///
/// let mut codec = FrameCodec::new();
/// let mut buffer = BytesMut::from(&[0x4A, 0x4D, 0x91, 0x00, 0x01, 0x00][..]);
///
/// let msg = codec.decode(&mut buffer).unwrap().unwrap();
/// assert_eq!(msg.message_type, MessageType::NfcData);
/// assert_eq!(&msg.payload[..], &[0x00]);
/// ```
#[derive(Debug)]
pub struct FrameCodec {
    /// Header of the frame whose payload is still being received.
    pending: Option<FrameHeader>,

    /// Maximum accepted payload length in bytes.
    max_payload_size: usize,
}

impl FrameCodec {
    /// Create a codec with the server's payload limit (4096 bytes).
    pub fn new() -> Self {
        Self::with_max_payload_size(MAX_PAYLOAD_SIZE)
    }

    /// Create a codec with a custom payload limit.
    ///
    /// Limits above 65535 have no effect since the length field is 16 bits.
    pub fn with_max_payload_size(max_payload_size: usize) -> Self {
        Self {
            pending: None,
            max_payload_size,
        }
    }

    /// Get the current payload limit.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let header = match self.pending {
            Some(header) => header,
            None => {
                if src.len() < HEADER_SIZE {
                    src.reserve(HEADER_SIZE - src.len());
                    return Ok(None);
                }

                let header = FrameHeader::parse(&src[..HEADER_SIZE])?;
                if header.length as usize > self.max_payload_size {
                    return Err(Error::PayloadTooLarge {
                        size: header.length as usize,
                        max_size: self.max_payload_size,
                    });
                }

                src.advance(HEADER_SIZE);
                self.pending = Some(header);
                header
            }
        };

        let length = header.length as usize;
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        self.pending = None;
        let payload = src.split_to(length).freeze();
        Ok(Some(Message {
            message_type: header.message_type,
            payload,
        }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        match self.pending {
            Some(header) => Err(Error::ConnectionClosed {
                expected: header.frame_size(),
                received: HEADER_SIZE + src.len(),
            }),
            None if !src.is_empty() => Err(Error::ConnectionClosed {
                expected: HEADER_SIZE,
                received: src.len(),
            }),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let size = item.payload_len();
        let max_size = self.max_payload_size.min(u16::MAX as usize);
        if size > max_size {
            return Err(Error::PayloadTooLarge { size, max_size });
        }

        let header = FrameHeader::new(item.message_type, size as u16);
        dst.reserve(header.frame_size());
        dst.put_slice(&header.to_bytes());
        dst.put_slice(&item.payload);
        Ok(())
    }
}
