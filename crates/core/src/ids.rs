#![forbid(unsafe_code)]

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

const MAX_ID_LEN: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MissionId(String);

impl MissionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, MissionIdError> {
        let value = value.into();
        validate_mission_id(&value)?;
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(format!("m-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MissionId {
    type Error = MissionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<MissionId> for String {
    fn from(value: MissionId) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MissionIdError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl fmt::Display for MissionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "mission id must not be empty"),
            Self::TooLong => write!(f, "mission id is too long"),
            Self::InvalidFirstChar => write!(f, "mission id must start with an ascii alphanumeric"),
            Self::InvalidChar { ch, index } => {
                write!(f, "mission id contains invalid char {ch:?} at {index}")
            }
        }
    }
}

impl std::error::Error for MissionIdError {}

fn validate_mission_id(value: &str) -> Result<(), MissionIdError> {
    if value.is_empty() {
        return Err(MissionIdError::Empty);
    }
    if value.len() > MAX_ID_LEN {
        return Err(MissionIdError::TooLong);
    }
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(MissionIdError::Empty);
    };
    if !first.is_ascii_alphanumeric() {
        return Err(MissionIdError::InvalidFirstChar);
    }
    for (index, ch) in chars.enumerate() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            continue;
        }
        return Err(MissionIdError::InvalidChar {
            ch,
            index: index + 1,
        });
    }
    Ok(())
}

/// Id of a record inside one of a mission's collections.
///
/// Callers may supply their own ids (the default roadmap uses `1..=4`), so integer JSON ids,
/// negative ones included, are accepted on input and normalized to their decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, ItemIdError> {
        let value = value.into();
        validate_item_id(&value)?;
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl From<u32> for ItemId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ItemIdVisitor)
    }
}

struct ItemIdVisitor;

impl<'de> Visitor<'de> for ItemIdVisitor {
    type Value = ItemId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an item id as a string or an integer")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ItemId, E> {
        ItemId::try_new(value).map_err(E::custom)
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<ItemId, E> {
        ItemId::try_new(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ItemId, E> {
        Ok(ItemId(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ItemId, E> {
        Ok(ItemId(value.to_string()))
    }

    /// Integral floats (`2.0`) normalize to their integer form; fractional ids are rejected.
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<ItemId, E> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            return Ok(ItemId((value as i64).to_string()));
        }
        Err(E::invalid_value(de::Unexpected::Float(value), &self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemIdError {
    Empty,
    TooLong,
    ContainsControl,
}

impl fmt::Display for ItemIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "item id must not be empty"),
            Self::TooLong => write!(f, "item id is too long"),
            Self::ContainsControl => write!(f, "item id contains control characters"),
        }
    }
}

impl std::error::Error for ItemIdError {}

fn validate_item_id(value: &str) -> Result<(), ItemIdError> {
    if value.trim().is_empty() {
        return Err(ItemIdError::Empty);
    }
    if value.len() > MAX_ID_LEN {
        return Err(ItemIdError::TooLong);
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(ItemIdError::ContainsControl);
    }
    Ok(())
}
