//! Data models for Katalog

mod book;
mod id;
mod kind;
mod lookup;

pub use book::{Book, BookDraft};
pub use id::EntityId;
pub use kind::EntityKind;
pub use lookup::{LookupEntry, LookupKind};
