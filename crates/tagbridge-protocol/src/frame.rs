use crate::message::{Message, MessageType};
use bytes::{BufMut, Bytes, BytesMut};
use tagbridge_core::{
    Error, Result,
    constants::{HEADER_SIZE, MAGIC},
};

/// Fixed 5-byte header that opens every frame.
///
/// # Wire Format
/// ```text
/// [MAGIC:2][TYPE:1][LENGTH:2]
///  4A 4D    12      00 07
/// ```
/// Both multi-byte fields are big-endian. `LENGTH` counts the payload bytes
/// that follow the header and nothing else.
///
/// # Basic Usage
/// ```
/// use tagbridge_protocol::{FrameHeader, MessageType};
///
/// let header = FrameHeader::new(MessageType::NfcRegister, 7);
/// assert_eq!(header.to_bytes(), [0x4A, 0x4D, 0x12, 0x00, 0x07]);
///
/// let parsed = FrameHeader::parse(&header.to_bytes()).unwrap();
/// assert_eq!(parsed, header);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub message_type: MessageType,
    pub length: u16,
}

impl FrameHeader {
    pub fn new(message_type: MessageType, length: u16) -> Self {
        FrameHeader {
            message_type,
            length,
        }
    }

    /// Parse and validate a header from the first [`HEADER_SIZE`] bytes.
    ///
    /// # Errors
    /// - `Error::InvalidMessageFormat` if fewer than 5 bytes are given
    /// - `Error::BadMagic` if the frame marker does not match
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let header: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                Error::InvalidMessageFormat(format!(
                    "header needs {HEADER_SIZE} bytes, got {}",
                    bytes.len()
                ))
            })?;

        let magic = u16::from_be_bytes([header[0], header[1]]);
        if magic != MAGIC {
            return Err(Error::BadMagic {
                expected: MAGIC,
                actual: magic,
            });
        }

        Ok(FrameHeader {
            message_type: MessageType::from(header[2]),
            length: u16::from_be_bytes([header[3], header[4]]),
        })
    }

    /// Wire bytes of this header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [m0, m1] = MAGIC.to_be_bytes();
        let [l0, l1] = self.length.to_be_bytes();
        [m0, m1, self.message_type.as_u8(), l0, l1]
    }

    /// Total frame size (header plus payload).
    pub fn frame_size(&self) -> usize {
        HEADER_SIZE + self.length as usize
    }
}

/// Encode a complete frame (header followed by payload) into one buffer.
///
/// # Errors
/// Returns `Error::PayloadTooLarge` if the payload length does not fit the
/// 16-bit length field.
pub fn encode_frame(message: &Message) -> Result<Bytes> {
    let length = u16::try_from(message.payload_len()).map_err(|_| Error::PayloadTooLarge {
        size: message.payload_len(),
        max_size: u16::MAX as usize,
    })?;

    let header = FrameHeader::new(message.message_type, length);
    let mut buf = BytesMut::with_capacity(header.frame_size());
    buf.put_slice(&header.to_bytes());
    buf.put_slice(&message.payload);
    Ok(buf.freeze())
}
