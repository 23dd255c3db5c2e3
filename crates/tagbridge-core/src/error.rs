use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Wire protocol errors
    #[error("Bad magic: expected 0x{expected:04X}, got 0x{actual:04X}")]
    BadMagic { expected: u16, actual: u16 },

    #[error("Connection closed with {received} of {expected} frame bytes read")]
    ConnectionClosed { expected: usize, received: usize },

    #[error("Payload too large: {size} bytes exceeds maximum {max_size} bytes")]
    PayloadTooLarge { size: usize, max_size: usize },

    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Unexpected message type: 0x{0:02X}")]
    UnexpectedMessageType(u8),

    // Tag identity errors
    #[error("Invalid tag UID: {0}")]
    InvalidUid(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("Unknown unit type: {0}")]
    UnknownUnitKind(String),

    #[error("Unknown rarity: {0}")]
    UnknownRarity(String),

    // Event stream errors
    #[error("Invalid event line: {0}")]
    InvalidEvent(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
