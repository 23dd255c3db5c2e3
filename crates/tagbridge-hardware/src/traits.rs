//! Reader capability trait.
//!
//! The station never talks to a reader chip directly. Everything it needs
//! from a reader fits in three transactions: a one-time firmware probe, a
//! bounded poll for a tag in the field, and a read of one memory block of the
//! tag selected by the last poll. Chip drivers and the scripted mock both
//! implement [`TagReader`], and the station reaches them through the
//! [`AnyTagReader`](crate::devices::AnyTagReader) enum.
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! without the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use tagbridge_core::TagUid;

use crate::error::Result;
use crate::types::{Block, FirmwareInfo};

/// A contactless reader sitting on one select line of the shared bus.
///
/// # Contract
///
/// - `poll_tag` returns `Ok(None)` when the field is empty. A reader may also
///   report an empty field as [`HardwareError::Timeout`](crate::HardwareError::Timeout);
///   callers must treat both the same way.
/// - `read_block` refers to the tag selected by the most recent successful
///   `poll_tag`. `Ok(None)` means the block is not readable yet (tag moving
///   out of the field, or still settling) and is not a fault.
/// - Every other error is a reader fault.
pub trait TagReader: Send + Sync {
    /// Human-readable reader name used in logs.
    fn name(&self) -> &str;

    /// Query the reader firmware once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader does not answer, in which case the slot
    /// is unusable.
    async fn probe(&mut self) -> Result<FirmwareInfo>;

    /// Look for a tag in the field, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails.
    async fn poll_tag(&mut self, timeout: Duration) -> Result<Option<TagUid>>;

    /// Read one 4-byte block (page) of the selected tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus transaction fails or no tag is selected.
    async fn read_block(&mut self, index: u8) -> Result<Option<Block>>;
}
