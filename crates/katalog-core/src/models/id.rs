//! Server-assigned entity identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier assigned by the catalog service.
///
/// The client never mints one. Forms in the wild post ids as strings, so
/// decoding accepts `7` and `"7"` alike; encoding always emits a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "LenientNumber", into = "i64")]
pub struct EntityId(i64);

impl EntityId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<EntityId> for i64 {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl TryFrom<LenientNumber> for EntityId {
    type Error = String;

    fn try_from(value: LenientNumber) -> Result<Self, Self::Error> {
        value.as_i64().map(Self)
    }
}

/// A JSON number that may arrive quoted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum LenientNumber {
    Int(i64),
    Text(String),
}

impl LenientNumber {
    pub(crate) fn as_i64(&self) -> Result<i64, String> {
        match self {
            Self::Int(value) => Ok(*value),
            Self::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| format!("expected a number, got {raw:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_numbers_and_numeric_strings() {
        let from_number: EntityId = serde_json::from_str("7").unwrap();
        let from_text: EntityId = serde_json::from_str("\" 7 \"").unwrap();
        assert_eq!(from_number, EntityId::new(7));
        assert_eq!(from_text, EntityId::new(7));
    }

    #[test]
    fn rejects_non_numeric_strings() {
        assert!(serde_json::from_str::<EntityId>("\"abc\"").is_err());
    }

    #[test]
    fn encodes_as_plain_number() {
        assert_eq!(serde_json::to_string(&EntityId::new(42)).unwrap(), "42");
    }
}
