//! Enum wrapper for reader dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the station cannot hold
//! `Box<dyn TagReader>`. [`AnyTagReader`] gives it one concrete type to store
//! per slot, dispatching to the wrapped reader at compile time.
//!
//! # Examples
//!
//! ```
//! use tagbridge_hardware::devices::AnyTagReader;
//! use tagbridge_hardware::mock::MockReader;
//! use tagbridge_hardware::traits::TagReader;
//!
//! #[tokio::main]
//! async fn main() -> tagbridge_hardware::Result<()> {
//!     let (reader, _handle) = MockReader::new();
//!     let mut any_reader = AnyTagReader::from(reader);
//!
//!     let firmware = any_reader.probe().await?;
//!     println!("{}: {}", any_reader.name(), firmware);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tagbridge_core::TagUid;

use crate::mock::MockReader;
use crate::traits::TagReader;
use crate::{Block, FirmwareInfo, Result};

/// Enum wrapper for reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagReader {
    /// Scripted reader for development, simulation and tests.
    Mock(MockReader),
    // TODO: Pn532Spi variant once a SPI transport crate is chosen
}

impl From<MockReader> for AnyTagReader {
    fn from(reader: MockReader) -> Self {
        Self::Mock(reader)
    }
}

impl TagReader for AnyTagReader {
    fn name(&self) -> &str {
        match self {
            Self::Mock(device) => device.name(),
        }
    }

    async fn probe(&mut self) -> Result<FirmwareInfo> {
        match self {
            Self::Mock(device) => device.probe().await,
        }
    }

    async fn poll_tag(&mut self, timeout: Duration) -> Result<Option<TagUid>> {
        match self {
            Self::Mock(device) => device.poll_tag(timeout).await,
        }
    }

    async fn read_block(&mut self, index: u8) -> Result<Option<Block>> {
        match self {
            Self::Mock(device) => device.read_block(index).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTag;

    #[tokio::test]
    async fn test_any_reader_dispatch() {
        let uid = TagUid::from_hex("04A3B2C1").unwrap();
        let (reader, handle) = MockReader::with_name("Slot 1");
        let mut reader = AnyTagReader::from(reader);

        assert_eq!(reader.name(), "Slot 1");
        assert_eq!(reader.probe().await.unwrap(), FirmwareInfo::default());

        handle.present(MockTag::with_text(uid.clone(), "Cat")).await.unwrap();
        let polled = reader.poll_tag(Duration::from_millis(50)).await.unwrap();
        assert_eq!(polled, Some(uid));

        let cc = reader.read_block(3).await.unwrap().unwrap();
        assert_eq!(cc[0], 0xE1);
    }
}
