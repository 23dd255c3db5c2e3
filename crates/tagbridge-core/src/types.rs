use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier reported by a contactless tag (4-10 bytes).
///
/// The UID is opaque: it is compared, hashed and rendered as uppercase hex,
/// never interpreted numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagUid(Vec<u8>);

impl TagUid {
    /// Create a new tag UID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the UID is not 4-10 bytes long.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(TagUid(bytes))
    }

    /// Parse a UID from its hex rendering (case-insensitive).
    ///
    /// # Errors
    /// Returns `Error::InvalidUid` if the text is not valid hex or decodes
    /// to an out-of-range length.
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = hex::decode(text.trim())
            .map_err(|e| Error::InvalidUid(format!("{text:?} is not hex: {e}")))?;
        Self::new(bytes)
    }

    /// Raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the UID.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a valid UID has at least four bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Uppercase hex rendering, two characters per byte.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Display for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for TagUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TagUid::from_hex(s)
    }
}

impl TryFrom<String> for TagUid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TagUid::from_hex(&value)
    }
}

impl From<TagUid> for String {
    fn from(uid: TagUid) -> Self {
        uid.to_hex()
    }
}

impl AsRef<[u8]> for TagUid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Reader slot position on the shared bus.
///
/// Stored zero-based (the select line index); displayed one-based, which is
/// how slots appear on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u8);

impl SlotId {
    /// Create a slot from its zero-based select line index.
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        SlotId(index)
    }

    /// Create a slot from its one-based display number.
    ///
    /// # Errors
    /// Returns `Error::InvalidSlot` if the number is zero.
    pub fn from_number(number: u8) -> Result<Self> {
        number
            .checked_sub(1)
            .map(SlotId)
            .ok_or_else(|| Error::InvalidSlot("slot numbers start at 1".to_string()))
    }

    /// Zero-based select line index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// One-based number used on the event stream.
    #[must_use]
    pub fn number(&self) -> u16 {
        self.0 as u16 + 1
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl std::str::FromStr for SlotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let number: u8 = s
            .parse()
            .map_err(|_| Error::InvalidSlot(format!("invalid slot number: {s}")))?;
        SlotId::from_number(number)
    }
}

/// Creature kind a tag is registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum UnitKind {
    Mushroom = 0,
    Goblin = 1,
    Cat = 2,
    Devil = 3,
    Fish = 4,
    Lizard = 5,
}

impl UnitKind {
    /// All kinds in type-index order.
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Mushroom,
        UnitKind::Goblin,
        UnitKind::Cat,
        UnitKind::Devil,
        UnitKind::Fish,
        UnitKind::Lizard,
    ];

    /// Create a unit kind from its wire type index.
    ///
    /// # Errors
    /// Returns `Error::UnknownUnitKind` for an index with no kind.
    pub fn from_u8(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| Error::UnknownUnitKind(value.to_string()))
    }

    /// Wire type index.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Mushroom => "mushroom",
            UnitKind::Goblin => "goblin",
            UnitKind::Cat => "cat",
            UnitKind::Devil => "devil",
            UnitKind::Fish => "fish",
            UnitKind::Lizard => "lizard",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either a name (`"goblin"`) or a type index (`"1"`).
impl std::str::FromStr for UnitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        if let Ok(index) = s.parse::<u8>() {
            return UnitKind::from_u8(index);
        }
        UnitKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or(Error::UnknownUnitKind(s))
    }
}

/// Rarity tier a tag is registered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Rarity {
    #[default]
    Common = 0,
    Rare = 1,
    Legendary = 2,
}

impl Rarity {
    /// Create a rarity from its wire value.
    ///
    /// # Errors
    /// Returns `Error::UnknownRarity` if the value is not 0, 1, or 2.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Rarity::Common),
            1 => Ok(Rarity::Rare),
            2 => Ok(Rarity::Legendary),
            _ => Err(Error::UnknownRarity(value.to_string())),
        }
    }

    /// Wire value.
    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either a name (`"rare"`) or a wire value (`"1"`).
impl std::str::FromStr for Rarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "common" | "0" => Ok(Rarity::Common),
            "rare" | "1" => Ok(Rarity::Rare),
            "legendary" | "2" => Ok(Rarity::Legendary),
            _ => Err(Error::UnknownRarity(s)),
        }
    }
}
