//! Tag registration payloads.
//!
//! # Request (`NfcRegister`, 0x12)
//!
//! ```text
//! [uid_len:1][uid:N][type_index:1][rarity:1]
//! ```
//!
//! # Response (`NfcData`, 0x91)
//!
//! ```text
//! [uid_len:1][uid:N][status:1][type_index:1][rarity:1][ability_id:1 level:1]...
//! ```
//!
//! The status byte sits at offset `1 + uid_len`; `0` means the tag was
//! registered. Registration responses stop after the rarity byte, lookup
//! responses append four ability slots.

use crate::message::{Message, MessageType};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tagbridge_core::{
    Error, Rarity, Result, TagUid, UnitKind,
    constants::{EMPTY_ABILITY_ID, MAX_ABILITIES, NFC_STATUS_OK},
};

/// Request registering a tag as a unit kind with a rarity.
///
/// # Examples
///
/// ```
/// use tagbridge_core::{Rarity, TagUid, UnitKind};
/// use tagbridge_protocol::RegistrationRequest;
///
/// let uid = TagUid::from_hex("ABCDEF01").unwrap();
/// let request = RegistrationRequest::new(uid, UnitKind::Cat, Rarity::Rare);
///
/// assert_eq!(&request.to_payload()[..], &[4, 0xAB, 0xCD, 0xEF, 0x01, 2, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub uid: TagUid,
    pub type_index: u8,
    pub rarity: u8,
}

impl RegistrationRequest {
    pub fn new(uid: TagUid, kind: UnitKind, rarity: Rarity) -> Self {
        Self::from_raw(uid, kind.to_u8(), rarity.to_u8())
    }

    /// Create a request from raw wire values, without checking that the
    /// type index or rarity are known.
    pub fn from_raw(uid: TagUid, type_index: u8, rarity: u8) -> Self {
        RegistrationRequest {
            uid,
            type_index,
            rarity,
        }
    }

    /// Encode the request payload.
    pub fn to_payload(&self) -> Bytes {
        let uid = self.uid.as_bytes();
        let mut buf = BytesMut::with_capacity(uid.len() + 3);
        // TagUid is at most 10 bytes, so the length always fits in one byte
        buf.put_u8(uid.len() as u8);
        buf.put_slice(uid);
        buf.put_u8(self.type_index);
        buf.put_u8(self.rarity);
        buf.freeze()
    }

    /// Parse a request payload.
    ///
    /// # Errors
    /// Returns an error if the payload is truncated or the UID length is
    /// out of range.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (uid, rest) = split_uid(payload)?;
        match rest {
            [type_index, rarity, ..] => Ok(RegistrationRequest {
                uid: TagUid::new(uid)?,
                type_index: *type_index,
                rarity: *rarity,
            }),
            _ => Err(Error::InvalidMessageFormat(format!(
                "registration request truncated after UID ({} bytes)",
                payload.len()
            ))),
        }
    }

    /// Wrap the payload in an `NfcRegister` message.
    pub fn into_message(self) -> Message {
        Message {
            message_type: MessageType::NfcRegister,
            payload: self.to_payload(),
        }
    }
}

/// Outcome reported in the response status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Ok,
    Failed(u8),
}

impl RegistrationStatus {
    pub fn from_u8(code: u8) -> Self {
        if code == NFC_STATUS_OK {
            RegistrationStatus::Ok
        } else {
            RegistrationStatus::Failed(code)
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            RegistrationStatus::Ok => NFC_STATUS_OK,
            RegistrationStatus::Failed(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, RegistrationStatus::Ok)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationStatus::Ok => write!(f, "OK"),
            RegistrationStatus::Failed(code) => write!(f, "failed (status {code})"),
        }
    }
}

/// One ability slot attached to a tag record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ability {
    /// Ability id, `-1` for an empty slot.
    pub ability_id: i8,
    pub level: u8,
}

impl Ability {
    pub fn is_empty(&self) -> bool {
        self.ability_id == EMPTY_ABILITY_ID
    }
}

/// Server response to a registration request.
///
/// Only the echoed UID and the status byte are required; the server always
/// sends type index and rarity after it, and lookups add ability slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationResponse {
    /// UID echoed by the server (not validated, the server decides its length).
    pub uid: Vec<u8>,
    pub status: RegistrationStatus,
    pub type_index: Option<u8>,
    pub rarity: Option<u8>,
    pub abilities: Vec<Ability>,
}

impl RegistrationResponse {
    /// Parse a response payload.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessageFormat` if the payload ends before the
    /// status byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagbridge_protocol::RegistrationResponse;
    ///
    /// let response = RegistrationResponse::parse(&[0x01, 0xAB, 0x00, 0x02, 0x01]).unwrap();
    /// assert!(response.is_success());
    /// assert_eq!(response.type_index, Some(2));
    /// ```
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let (uid, rest) = split_uid(payload)?;
        let (status, rest) = rest.split_first().ok_or_else(|| {
            Error::InvalidMessageFormat(format!(
                "response ends before status byte at offset {}",
                1 + uid.len()
            ))
        })?;

        let (type_index, rarity, abilities) = match rest {
            [type_index, rarity, abilities @ ..] => (
                Some(*type_index),
                Some(*rarity),
                abilities
                    .chunks_exact(2)
                    .take(MAX_ABILITIES)
                    .map(|pair| Ability {
                        ability_id: pair[0] as i8,
                        level: pair[1],
                    })
                    .collect(),
            ),
            [type_index] => (Some(*type_index), None, Vec::new()),
            [] => (None, None, Vec::new()),
        };

        Ok(RegistrationResponse {
            uid: uid.to_vec(),
            status: RegistrationStatus::from_u8(*status),
            type_index,
            rarity,
            abilities,
        })
    }

    /// Parse the payload of an `NfcData` message.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedMessageType` for any other message type.
    pub fn from_message(message: &Message) -> Result<Self> {
        match message.message_type {
            MessageType::NfcData => Self::parse(&message.payload),
            other => Err(Error::UnexpectedMessageType(other.as_u8())),
        }
    }

    /// Encode the response payload.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if the UID does not fit the one-byte
    /// length field.
    pub fn to_payload(&self) -> Result<Bytes> {
        let uid_len = u8::try_from(self.uid.len()).map_err(|_| Error::PayloadTooLarge {
            size: self.uid.len(),
            max_size: u8::MAX as usize,
        })?;
        let mut buf = BytesMut::with_capacity(self.uid.len() + 4 + self.abilities.len() * 2);
        buf.put_u8(uid_len);
        buf.put_slice(&self.uid);
        buf.put_u8(self.status.to_u8());
        if let Some(type_index) = self.type_index {
            buf.put_u8(type_index);
            if let Some(rarity) = self.rarity {
                buf.put_u8(rarity);
                for ability in &self.abilities {
                    buf.put_i8(ability.ability_id);
                    buf.put_u8(ability.level);
                }
            }
        }
        Ok(buf.freeze())
    }

    /// Wrap the payload in an `NfcData` message.
    ///
    /// # Errors
    /// Same as [`to_payload`](Self::to_payload).
    pub fn into_message(self) -> Result<Message> {
        Ok(Message {
            message_type: MessageType::NfcData,
            payload: self.to_payload()?,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// Abilities that are not empty slots.
    pub fn active_abilities(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.iter().filter(|a| !a.is_empty())
    }
}

/// Split `[uid_len][uid...][rest...]` into the UID and the remainder.
fn split_uid(payload: &[u8]) -> Result<(&[u8], &[u8])> {
    let (&uid_len, rest) = payload
        .split_first()
        .ok_or_else(|| Error::InvalidMessageFormat("empty payload".to_string()))?;

    let uid_len = uid_len as usize;
    if rest.len() < uid_len {
        return Err(Error::InvalidMessageFormat(format!(
            "UID length {uid_len} exceeds remaining {} bytes",
            rest.len()
        )));
    }
    Ok(rest.split_at(uid_len))
}
