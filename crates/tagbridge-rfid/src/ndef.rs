//! TLV / NDEF decoder for NTAG2xx user memory.
//!
//! User memory is a sequence of TLV blocks:
//!
//! ```text
//! [TYPE:1][LENGTH:1 | 0xFF LENGTH:2][VALUE:LENGTH]
//! ```
//!
//! `0x00` (NULL) is a one-byte filler with no length, `0xFE` (terminator)
//! ends the area, and `0x03` (NDEF message) holds the records. Other TLVs
//! (lock and memory control) are skipped by their length.
//!
//! Inside the NDEF message only the first record is looked at. Well-known
//! text (`T`) and URI (`U`) records produce text; any other record means the
//! tag carries nothing this station understands.
//!
//! Every read goes through [`Cursor`], so malformed or truncated memory
//! yields `None` instead of a panic.

use tracing::trace;

const TLV_NULL: u8 = 0x00;
const TLV_NDEF_MESSAGE: u8 = 0x03;
const TLV_TERMINATOR: u8 = 0xFE;
const TLV_LENGTH_ESCAPE: u8 = 0xFF;

const FLAG_SHORT_RECORD: u8 = 0x10;
const FLAG_ID_LENGTH: u8 = 0x08;
const TNF_MASK: u8 = 0x07;
const TNF_WELL_KNOWN: u8 = 0x01;

const RTD_TEXT: &[u8] = b"T";
const RTD_URI: &[u8] = b"U";

/// Low six bits of a text record status byte: language code length.
const TEXT_LANG_LENGTH_MASK: u8 = 0x3F;

/// Bounds-checked reader over an immutable byte slice.
#[derive(Debug)]
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16_be(&mut self) -> Option<u16> {
        let b = self.take(2)?;
        Some(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32_be(&mut self) -> Option<u32> {
        let b = self.take(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        let rest = self.bytes.get(self.pos..).unwrap_or_default();
        self.pos = self.bytes.len();
        rest
    }
}

/// Decode the text of the first NDEF record in tag user memory.
///
/// Returns `None` when the memory holds no NDEF message, the message is
/// truncated, or its first record is neither text nor URI.
///
/// # Examples
///
/// ```
/// use tagbridge_rfid::decode_tag_memory;
///
/// let memory = [
///     0x03, 0x0D, 0xD1, 0x01, 0x09, b'T', 0x02, b'e', b'n',
///     b'G', b'o', b'b', b'l', b'i', b'n', 0xFE,
/// ];
/// assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Goblin"));
///
/// assert_eq!(decode_tag_memory(&[0xFE, 0x03, 0x00]), None);
/// ```
pub fn decode_tag_memory(memory: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(memory);

    loop {
        let tlv_type = cursor.u8()?;
        match tlv_type {
            TLV_NULL => continue,
            TLV_TERMINATOR => {
                trace!("terminator TLV before any NDEF message");
                return None;
            }
            _ => {}
        }

        let length = match cursor.u8()? {
            TLV_LENGTH_ESCAPE => cursor.u16_be()? as usize,
            short => short as usize,
        };
        let value = cursor.take(length)?;

        if tlv_type == TLV_NDEF_MESSAGE {
            return decode_first_record(value);
        }
        trace!(tlv_type, length, "skipping TLV");
    }
}

fn decode_first_record(message: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(message);

    let flags = cursor.u8()?;
    let type_length = cursor.u8()? as usize;
    let payload_length = if flags & FLAG_SHORT_RECORD != 0 {
        cursor.u8()? as usize
    } else {
        usize::try_from(cursor.u32_be()?).ok()?
    };
    let id_length = if flags & FLAG_ID_LENGTH != 0 {
        cursor.u8()? as usize
    } else {
        0
    };
    let record_type = cursor.take(type_length)?;
    cursor.take(id_length)?;
    let payload = cursor.take(payload_length)?;

    if flags & TNF_MASK != TNF_WELL_KNOWN {
        trace!(tnf = flags & TNF_MASK, "record is not well-known");
        return None;
    }

    let mut payload = Cursor::new(payload);
    let text = match record_type {
        RTD_TEXT => {
            let status = payload.u8()?;
            payload.take((status & TEXT_LANG_LENGTH_MASK) as usize)?;
            payload.rest()
        }
        RTD_URI => {
            // Identifier code (URI prefix abbreviation), not expanded
            payload.u8()?;
            payload.rest()
        }
        other => {
            trace!(record_type = ?other, "unsupported record type");
            return None;
        }
    };

    Some(latin1(text))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const GOBLIN: &[u8] = &[
        0x03, 0x0D, 0xD1, 0x01, 0x09, b'T', 0x02, b'e', b'n', b'G', b'o', b'b', b'l', b'i', b'n',
        0xFE,
    ];

    #[test]
    fn test_goblin_text_record() {
        assert_eq!(decode_tag_memory(GOBLIN).as_deref(), Some("Goblin"));
    }

    #[test]
    fn test_leading_terminator() {
        assert_eq!(decode_tag_memory(&[0xFE]), None);
        assert_eq!(decode_tag_memory(&[0xFE, 0x03, 0x0D]), None);
    }

    #[test]
    fn test_filler_bytes_before_message() {
        let mut memory = vec![0x00, 0x00, 0x00];
        memory.extend_from_slice(GOBLIN);
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Goblin"));
    }

    #[test]
    fn test_lock_control_tlv_is_skipped() {
        let mut memory = vec![0x01, 0x03, 0xA0, 0x0C, 0x34];
        memory.extend_from_slice(GOBLIN);
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Goblin"));
    }

    #[test]
    fn test_length_escape_on_other_tlv() {
        let mut memory = vec![0x02, 0xFF, 0x00, 0x02, 0xAA, 0xBB];
        memory.extend_from_slice(GOBLIN);
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Goblin"));
    }

    #[test]
    fn test_length_escape_on_ndef_message() {
        let memory = [
            0x03, 0xFF, 0x00, 0x08, 0xD1, 0x01, 0x04, b'T', 0x00, b'C', b'a', b't', 0xFE,
        ];
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Cat"));
    }

    #[test]
    fn test_uri_record() {
        let mut memory = vec![0x03, 0x0F, 0xD1, 0x01, 0x0B, b'U', 0x04];
        memory.extend_from_slice(b"example.io");
        memory.push(0xFE);
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("example.io"));
    }

    #[test]
    fn test_long_record_header() {
        let memory = [
            0x03, 0x0B, 0xC1, 0x01, 0x00, 0x00, 0x00, 0x04, b'T', 0x00, b'F', b'o', b'x',
        ];
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Fox"));
    }

    #[test]
    fn test_record_with_id_field() {
        // IL set: ID length 2 after payload length, ID bytes after type
        let memory = [
            0x03, 0x0A, 0xD9, 0x01, 0x03, 0x02, b'T', 0x69, 0x64, 0x00, b'O', b'w', 0xFE,
        ];
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("Ow"));
    }

    #[test]
    fn test_latin1_bytes_map_to_chars() {
        let memory = [0x03, 0x07, 0xD1, 0x01, 0x03, b'T', 0x00, 0xE9, 0xFC];
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some("\u{e9}\u{fc}"));
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::only_filler(&[0x00, 0x00, 0x00])]
    #[case::missing_length(&[0x03])]
    #[case::truncated_message(&[0x03, 0x20, 0xD1, 0x01])]
    #[case::truncated_escape(&[0x03, 0xFF, 0x00])]
    #[case::mime_record(&[0x03, 0x07, 0xD2, 0x01, 0x03, b'x', 0x00, b'h', b'i'])]
    #[case::smart_poster(&[0x03, 0x08, 0xD1, 0x02, 0x03, b'S', b'p', 0x00, b'h', b'i'])]
    #[case::unknown_well_known(&[0x03, 0x07, 0xD1, 0x01, 0x03, b'Z', 0x00, b'h', b'i'])]
    #[case::language_past_end(&[0x03, 0x06, 0xD1, 0x01, 0x02, b'T', 0x3F, b'e'])]
    #[case::empty_text_payload(&[0x03, 0x04, 0xD1, 0x01, 0x00, b'T'])]
    #[case::payload_past_message(&[0x03, 0x05, 0xD1, 0x01, 0x40, b'T', 0x00])]
    fn test_malformed_memory_is_absent(#[case] memory: &[u8]) {
        assert_eq!(decode_tag_memory(memory), None);
    }

    #[test]
    fn test_empty_text_after_language() {
        let memory = [0x03, 0x07, 0xD1, 0x01, 0x03, b'T', 0x02, b'e', b'n'];
        assert_eq!(decode_tag_memory(&memory).as_deref(), Some(""));
    }

    proptest! {
        #[test]
        fn prop_decoder_never_panics(memory in prop::collection::vec(any::<u8>(), 0..128)) {
            let _ = decode_tag_memory(&memory);
        }

        #[test]
        fn prop_text_record_round_trip(text in "[ -~]{0,40}") {
            let payload_len = 3 + text.len();
            let mut memory = vec![0x03, (4 + payload_len) as u8, 0xD1, 0x01, payload_len as u8, b'T', 0x02, b'e', b'n'];
            memory.extend_from_slice(text.as_bytes());
            memory.push(0xFE);
            prop_assert_eq!(decode_tag_memory(&memory), Some(text));
        }
    }
}
