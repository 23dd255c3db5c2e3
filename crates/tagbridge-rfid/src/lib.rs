//! Tag memory decoding.
//!
//! Reads the user memory of a tag block by block through a
//! [`TagReader`](tagbridge_hardware::TagReader) and extracts the text carried
//! in its first NDEF record.
//!
//! - [`ndef`]: pure TLV / NDEF decoder over a byte slice
//! - [`memory`]: block-reading glue that feeds the decoder

pub mod memory;
pub mod ndef;

pub use memory::{MemoryLayout, read_memory, read_payload};
pub use ndef::decode_tag_memory;
