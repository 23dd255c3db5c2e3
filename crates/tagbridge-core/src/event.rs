//! Line-oriented event stream emitted by the reader station.
//!
//! The station reports tag activity as one text line per event:
//!
//! ```text
//! UID:1:04A3B2C1D2E3F4
//! PAYLOAD:Goblin
//! REMOVED:1
//! ```
//!
//! [`TagEvent`] renders these lines through `Display` and parses them back
//! through `FromStr`, so the producer and the host-side consumers agree on a
//! single format.
//!
//! # Examples
//!
//! ```
//! use tagbridge_core::{SlotId, TagEvent, TagUid};
//!
//! let event = TagEvent::Uid {
//!     slot: SlotId::from_index(0),
//!     uid: TagUid::from_hex("04A3B2C1").unwrap(),
//! };
//! assert_eq!(event.to_string(), "UID:1:04A3B2C1");
//!
//! let parsed: TagEvent = "REMOVED:2".parse().unwrap();
//! assert_eq!(parsed, TagEvent::Removed { slot: SlotId::from_index(1) });
//! ```

use crate::{Error, Result, SlotId, TagUid};
use std::fmt;

const UID_PREFIX: &str = "UID:";
const PAYLOAD_PREFIX: &str = "PAYLOAD:";
const REMOVED_PREFIX: &str = "REMOVED:";

/// One event on the station's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// A tag was identified on a slot (decoded or abandoned decoding).
    Uid { slot: SlotId, uid: TagUid },

    /// Content of the most recently identified tag on the emitting slot.
    ///
    /// Holds the decoded text, or the hex UID when decoding was abandoned.
    Payload(String),

    /// A previously reported tag left the slot.
    Removed { slot: SlotId },
}

impl TagEvent {
    /// Slot the event refers to, if it names one.
    #[must_use]
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            TagEvent::Uid { slot, .. } | TagEvent::Removed { slot } => Some(*slot),
            TagEvent::Payload(_) => None,
        }
    }
}

impl fmt::Display for TagEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TagEvent::Uid { slot, uid } => write!(f, "{UID_PREFIX}{slot}:{uid}"),
            TagEvent::Payload(text) => {
                // One event per line: line breaks inside tag text must not split it
                f.write_str(PAYLOAD_PREFIX)?;
                for c in text.chars() {
                    let c = if c == '\n' || c == '\r' { ' ' } else { c };
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            TagEvent::Removed { slot } => write!(f, "{REMOVED_PREFIX}{slot}"),
        }
    }
}

impl std::str::FromStr for TagEvent {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(rest) = line.strip_prefix(UID_PREFIX) {
            let (slot, uid) = rest
                .split_once(':')
                .ok_or_else(|| Error::InvalidEvent(format!("missing UID field: {line}")))?;
            return Ok(TagEvent::Uid {
                slot: slot.parse()?,
                uid: uid.parse()?,
            });
        }

        if let Some(text) = line.strip_prefix(PAYLOAD_PREFIX) {
            return Ok(TagEvent::Payload(text.to_string()));
        }

        if let Some(slot) = line.strip_prefix(REMOVED_PREFIX) {
            return Ok(TagEvent::Removed {
                slot: slot.trim().parse()?,
            });
        }

        Err(Error::InvalidEvent(line.to_string()))
    }
}
