//! Core constants for the tag registration protocol and the reader station.
//!
//! This module defines the protocol-level constants shared by the host tools
//! and the wire codec, together with the default tuning values of the
//! multi-reader polling loop.
//!
//! # Protocol Structure
//!
//! Every message on the registration connection is a single frame:
//!
//! ```text
//! [MAGIC:2][TYPE:1][LENGTH:2][PAYLOAD:LENGTH]
//! ```
//!
//! Where:
//! - `MAGIC` - Fixed marker `0x4A4D`, big-endian
//! - `TYPE` - Message type code
//! - `LENGTH` - Payload length in bytes, big-endian
//! - `PAYLOAD` - Exactly `LENGTH` bytes
//!
//! # Usage
//!
//! ```
//! use tagbridge_core::constants::*;
//!
//! assert_eq!(HEADER_SIZE, 5);
//! assert_eq!(MAGIC.to_be_bytes(), [0x4A, 0x4D]);
//!
//! use std::time::Duration;
//! let timeout = Duration::from_millis(DEFAULT_REGISTRATION_TIMEOUT_MS);
//! assert_eq!(timeout.as_secs(), 5);
//! ```

// ============================================================================
// Message Framing
// ============================================================================

/// Frame marker that opens every message ("JM").
///
/// A received frame whose first two bytes differ from this value is
/// rejected as a protocol error.
pub const MAGIC: u16 = 0x4A4D;

/// Size of the fixed frame header in bytes.
///
/// ```text
/// [MAGIC:2][TYPE:1][LENGTH:2]
/// ```
pub const HEADER_SIZE: usize = 5;

/// Largest payload the server accepts in one frame.
///
/// The length field could express up to 65535 bytes, but the server
/// drops anything above this size, so the codec rejects it up front.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

// ============================================================================
// Message Types
// ============================================================================

/// Client request registering a tag with a unit type and rarity.
///
/// Payload: `[uid_len:1][uid:N][type_index:1][rarity:1]`
pub const MSG_NFC_REGISTER: u8 = 0x12;

/// Server response carrying a tag record.
///
/// Payload: `[uid_len:1][uid:N][status:1][type_index:1][rarity:1][abilities...]`
pub const MSG_NFC_DATA: u8 = 0x91;

// ============================================================================
// Status Codes
// ============================================================================

/// Registration status reported by the server on success.
///
/// Any other status value is a failure.
pub const NFC_STATUS_OK: u8 = 0;

/// Number of ability slots a tag record carries.
pub const MAX_ABILITIES: usize = 4;

/// Ability id marking an empty ability slot (`-1` on the wire).
pub const EMPTY_ABILITY_ID: i8 = -1;

// ============================================================================
// Tag Identity
// ============================================================================

/// Minimum UID length in bytes (per ISO 14443 specification).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (per ISO 14443 specification).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Network Configuration
// ============================================================================

/// Default registration server port.
pub const DEFAULT_SERVER_PORT: u16 = 7777;

/// Default connect/read timeout for one registration exchange (milliseconds).
pub const DEFAULT_REGISTRATION_TIMEOUT_MS: u64 = 5000;

/// Baud rate of the station's USB serial event stream.
pub const DEFAULT_SERIAL_BAUD: u32 = 115_200;

// ============================================================================
// Reader Station Configuration
// ============================================================================

/// Default number of reader slots on the shared bus.
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// Default per-reader poll timeout (milliseconds).
///
/// With four readers this gives a full round-robin pass of about 200ms.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 50;

/// Default time budget for one payload decode attempt (milliseconds).
pub const DEFAULT_DECODE_BUDGET_MS: u64 = 100;

/// Consecutive poll faults after which a slot is disabled for good.
pub const DEFAULT_MAX_FAULTS: u32 = 5;

/// Payload decode attempts before falling back to the raw UID.
pub const DEFAULT_MAX_DECODE_RETRIES: u32 = 10;

/// First tag memory block holding user data (NTAG2xx page 4).
pub const DEFAULT_FIRST_BLOCK: u8 = 4;

/// Number of 4-byte blocks read per decode attempt.
pub const DEFAULT_BLOCK_COUNT: u8 = 16;

/// Size of one tag memory block in bytes.
pub const BLOCK_SIZE: usize = 4;
