//! Common types shared across reader implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use tagbridge_core::constants::BLOCK_SIZE;

/// One fixed-size block (page) of tag memory.
pub type Block = [u8; BLOCK_SIZE];

/// Firmware identity returned by the one-time reader probe.
///
/// Mirrors the four bytes a PN53x answers to `GetFirmwareVersion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    /// IC code (`0x32` for a PN532).
    pub ic: u8,

    /// Firmware major version.
    pub version: u8,

    /// Firmware revision.
    pub revision: u8,

    /// Supported card families bitmask.
    pub support: u8,
}

impl FirmwareInfo {
    /// Create firmware info from its four raw bytes.
    pub fn new(ic: u8, version: u8, revision: u8, support: u8) -> Self {
        Self {
            ic,
            version,
            revision,
            support,
        }
    }
}

impl Default for FirmwareInfo {
    fn default() -> Self {
        // PN532 v1.6, ISO14443A/B and FeliCa
        Self::new(0x32, 1, 6, 0x07)
    }
}

impl fmt::Display for FirmwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PN5{:02X} v{}.{}", self.ic, self.version, self.revision)
    }
}

/// Reader metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "PN532 @ GP5").
    pub name: String,

    /// Firmware reported by the probe.
    pub firmware: FirmwareInfo,
}

impl ReaderInfo {
    pub fn new(name: impl Into<String>, firmware: FirmwareInfo) -> Self {
        Self {
            name: name.into(),
            firmware,
        }
    }
}

impl fmt::Display for ReaderInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.firmware)
    }
}
