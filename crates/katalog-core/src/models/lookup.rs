//! Reference data: statuses, categories and users

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::EntityId;
use super::kind::EntityKind;

/// A status, category or user row. All three share the `{ id, nama }` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub id: EntityId,
    #[serde(rename = "nama", alias = "name", alias = "username")]
    pub name: String,
}

impl LookupEntry {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Which lookup collection a foreign key points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LookupKind {
    Status,
    Category,
    User,
}

impl LookupKind {
    pub const ALL: [Self; 3] = [Self::Status, Self::Category, Self::User];

    /// Durable store key holding the last-known snapshot.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Status => "statusOptions",
            Self::Category => "categoryOptions",
            Self::User => "userOptions",
        }
    }

    #[must_use]
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Status => EntityKind::Status,
            Self::Category => EntityKind::Category,
            Self::User => EntityKind::User,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Category => "category",
            Self::User => "user",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" | "statusbuku" => Ok(Self::Status),
            "category" | "kategori" => Ok(Self::Category),
            "user" | "owner" => Ok(Self::User),
            other => Err(format!("unknown lookup kind: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nama_and_username() {
        let status: LookupEntry = serde_json::from_str(r#"{"id":1,"nama":"Tersedia"}"#).unwrap();
        let user: LookupEntry = serde_json::from_str(r#"{"id":2,"username":"sari"}"#).unwrap();
        assert_eq!(status.name, "Tersedia");
        assert_eq!(user.name, "sari");
    }

    #[test]
    fn storage_keys_are_distinct() {
        assert_eq!(LookupKind::Status.storage_key(), "statusOptions");
        assert_ne!(
            LookupKind::Category.storage_key(),
            LookupKind::User.storage_key()
        );
    }

    #[test]
    fn parses_service_spellings() {
        assert_eq!("statusBuku".parse::<LookupKind>(), Ok(LookupKind::Status));
        assert_eq!("kategori".parse::<LookupKind>(), Ok(LookupKind::Category));
        assert!("genre".parse::<LookupKind>().is_err());
    }
}
