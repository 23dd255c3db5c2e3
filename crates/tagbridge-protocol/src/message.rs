use bytes::Bytes;
use std::fmt;
use tagbridge_core::{
    Error, Result,
    constants::{MAX_PAYLOAD_SIZE, MSG_NFC_DATA, MSG_NFC_REGISTER},
};

/// Message type carried in the third header byte.
///
/// Unknown codes are kept as [`MessageType::Other`] so that a frame with an
/// unexpected type still decodes and the caller decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Tag registration request (`0x12`).
    NfcRegister,
    /// Tag record response (`0x91`).
    NfcData,
    /// Any other type code.
    Other(u8),
}

impl MessageType {
    /// Wire code.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            MessageType::NfcRegister => MSG_NFC_REGISTER,
            MessageType::NfcData => MSG_NFC_DATA,
            MessageType::Other(code) => code,
        }
    }
}

impl From<u8> for MessageType {
    fn from(code: u8) -> Self {
        match code {
            MSG_NFC_REGISTER => MessageType::NfcRegister,
            MSG_NFC_DATA => MessageType::NfcData,
            other => MessageType::Other(other),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::NfcRegister => write!(f, "NfcRegister"),
            MessageType::NfcData => write!(f, "NfcData"),
            MessageType::Other(code) => write!(f, "0x{code:02X}"),
        }
    }
}

/// One protocol message: a type code and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_type: MessageType,
    pub payload: Bytes,
}

impl Message {
    /// Create a message, checking that the payload fits in one frame.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if the payload exceeds
    /// [`MAX_PAYLOAD_SIZE`].
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max_size: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Message {
            message_type,
            payload,
        })
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes() {
        assert_eq!(MessageType::from(0x12), MessageType::NfcRegister);
        assert_eq!(MessageType::from(0x91), MessageType::NfcData);
        assert_eq!(MessageType::from(0x88), MessageType::Other(0x88));
        assert_eq!(MessageType::Other(0x88).as_u8(), 0x88);
        assert_eq!(MessageType::NfcData.as_u8(), 0x91);
    }

    #[test]
    fn test_message_type_display() {
        assert_eq!(MessageType::NfcRegister.to_string(), "NfcRegister");
        assert_eq!(MessageType::Other(0x0A).to_string(), "0x0A");
    }

    #[test]
    fn test_message_creation() {
        let msg = Message::new(MessageType::NfcData, vec![1, 2, 3]).unwrap();
        assert_eq!(msg.payload_len(), 3);
        assert_eq!(msg.message_type, MessageType::NfcData);
    }

    #[test]
    fn test_message_payload_limit() {
        assert!(Message::new(MessageType::NfcData, vec![0u8; MAX_PAYLOAD_SIZE]).is_ok());

        let result = Message::new(MessageType::NfcData, vec![0u8; MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }
}
