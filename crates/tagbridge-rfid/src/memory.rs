//! Block-reading glue between a reader and the NDEF decoder.

use tagbridge_core::constants::{BLOCK_SIZE, DEFAULT_BLOCK_COUNT, DEFAULT_FIRST_BLOCK};
use tagbridge_hardware::{Result, TagReader};
use tracing::debug;

use crate::ndef::decode_tag_memory;

/// Which blocks hold the NDEF area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    /// First block to read (page 4 is the first user page of an NTAG2xx).
    pub first_block: u8,
    /// Number of blocks read per attempt.
    pub block_count: u8,
}

impl MemoryLayout {
    pub fn new(first_block: u8, block_count: u8) -> Self {
        Self {
            first_block,
            block_count,
        }
    }

    /// Bytes covered by one full read.
    pub fn byte_len(&self) -> usize {
        self.block_count as usize * BLOCK_SIZE
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self::new(DEFAULT_FIRST_BLOCK, DEFAULT_BLOCK_COUNT)
    }
}

/// Read the NDEF area of the selected tag.
///
/// Returns `Ok(None)` as soon as one block is not readable yet, or when the
/// layout runs past the last block index.
///
/// # Errors
///
/// Returns the reader error of the first failed block read.
pub async fn read_memory<R: TagReader>(
    reader: &mut R,
    layout: MemoryLayout,
) -> Result<Option<Vec<u8>>> {
    let mut memory = Vec::with_capacity(layout.byte_len());

    for offset in 0..layout.block_count {
        let Some(index) = layout.first_block.checked_add(offset) else {
            return Ok(None);
        };
        match reader.read_block(index).await? {
            Some(block) => memory.extend_from_slice(&block),
            None => {
                debug!(reader = reader.name(), index, "block not readable yet");
                return Ok(None);
            }
        }
    }

    Ok(Some(memory))
}

/// One decode attempt: read the NDEF area and decode its first record.
///
/// Read failures and unreadable blocks make the attempt fail like malformed
/// memory does; they are never reader faults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tagbridge_core::TagUid;
/// use tagbridge_hardware::TagReader;
/// use tagbridge_hardware::mock::{MockReader, MockTag, PollStep};
/// use tagbridge_rfid::{MemoryLayout, read_payload};
///
/// #[tokio::main]
/// async fn main() {
///     let uid = TagUid::from_hex("04A3B2C1").unwrap();
///     let tag = MockTag::with_text(uid, "Goblin");
///     let mut reader = MockReader::scripted("r", vec![PollStep::Tag(tag)]);
///
///     reader.poll_tag(Duration::from_millis(50)).await.unwrap();
///     let text = read_payload(&mut reader, MemoryLayout::default()).await;
///     assert_eq!(text.as_deref(), Some("Goblin"));
/// }
/// ```
pub async fn read_payload<R: TagReader>(reader: &mut R, layout: MemoryLayout) -> Option<String> {
    match read_memory(reader, layout).await {
        Ok(Some(memory)) => decode_tag_memory(&memory),
        Ok(None) => None,
        Err(e) => {
            debug!(reader = reader.name(), error = %e, "tag memory read failed");
            None
        }
    }
}
