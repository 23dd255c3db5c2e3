//! Reader abstraction for the tag station.
//!
//! This crate defines what the station needs from a contactless reader and
//! provides a scripted mock so the station runs without hardware.
//!
//! # Modules
//!
//! - [`traits`]: the [`TagReader`] capability (probe, poll, block read)
//! - [`devices`]: enum dispatch over reader implementations
//! - [`mock`]: scripted reader and its control handle
//! - [`error`]: [`HardwareError`] and the crate `Result`
//! - [`types`]: firmware and reader metadata, memory block type
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tagbridge_core::TagUid;
//! use tagbridge_hardware::{AnyTagReader, TagReader};
//! use tagbridge_hardware::mock::{MockReader, MockTag};
//!
//! #[tokio::main]
//! async fn main() -> tagbridge_hardware::Result<()> {
//!     let (reader, handle) = MockReader::new();
//!     let mut reader = AnyTagReader::from(reader);
//!
//!     let uid = TagUid::from_hex("04A3B2C1").unwrap();
//!     handle.present(MockTag::with_text(uid.clone(), "Goblin")).await?;
//!
//!     assert_eq!(reader.poll_tag(Duration::from_millis(50)).await?, Some(uid));
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::AnyTagReader;
pub use error::{HardwareError, Result};
pub use traits::TagReader;
pub use types::{Block, FirmwareInfo, ReaderInfo};
