//! katalog-core - Core library for Katalog
//!
//! This crate contains the catalog models, the REST gateway, and the client
//! side caches (lookup tables, book collection) used by every Katalog
//! front end. Front ends hold a [`CatalogService`] and render
//! [`DisplayBook`]s; nothing here keeps global state.

pub mod config;
pub mod credential;
pub mod display;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod lookup;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use display::{DisplayBook, UNKNOWN_NAME};
pub use error::{Error, FetchError, FetchResult, Result};
pub use filter::{BookView, FilterKind};
pub use models::{Book, BookDraft, EntityId, LookupEntry, LookupKind};
pub use services::{CatalogService, InitReport};
pub use state::{DataSource, SyncPhase};
