//! Entity kinds and their REST collection paths

use std::fmt;

/// The four collections the catalog service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Book,
    Status,
    Category,
    User,
}

impl EntityKind {
    /// Collection path relative to the API base URL.
    #[must_use]
    pub const fn collection_path(self) -> &'static str {
        match self {
            Self::Book => "/buku",
            Self::Status => "/statusBuku",
            Self::Category => "/kategori",
            Self::User => "/user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Book => "book",
            Self::Status => "status",
            Self::Category => "category",
            Self::User => "user",
        };
        f.write_str(name)
    }
}
