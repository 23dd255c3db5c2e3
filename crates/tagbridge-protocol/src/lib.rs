//! Binary wire protocol for registering contactless tags with the game server.
//!
//! Messages travel as single frames over a byte stream:
//!
//! ```text
//! [MAGIC:2 = 0x4A4D][TYPE:1][LENGTH:2][PAYLOAD:LENGTH]
//! ```
//!
//! - [`FrameHeader`]: the fixed 5-byte header
//! - [`Message`]: a decoded frame (type + payload)
//! - [`FrameCodec`]: Tokio codec for `Framed` streams
//! - [`registration`]: request/response payload layouts

pub mod codec;
pub mod frame;
pub mod message;
pub mod registration;

pub use codec::FrameCodec;
pub use frame::FrameHeader;
pub use message::{Message, MessageType};
pub use registration::{Ability, RegistrationRequest, RegistrationResponse, RegistrationStatus};
