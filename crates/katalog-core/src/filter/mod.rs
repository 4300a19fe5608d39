//! Book filters: which remote query backs the book list.
//!
//! Every filter kind has its own sub-resource (`/buku/user/{id}`,
//! `/buku/kategori/{id}`, `/buku/statusBuku/{id}`). The bare `/buku/{value}`
//! path is never used for filtering; it would collide with id lookup.

use std::fmt;
use std::str::FromStr;

use crate::error::FetchResult;
use crate::gateway::EntityGateway;
use crate::sync::{BookSynchronizer, LoadOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterKind {
    #[default]
    All,
    Owner,
    Category,
    Status,
}

impl FilterKind {
    const fn path_segment(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Owner => Some("user"),
            Self::Category => Some("kategori"),
            Self::Status => Some("statusBuku"),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::All => "all",
            Self::Owner => "owner",
            Self::Category => "category",
            Self::Status => "status",
        };
        f.write_str(label)
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "owner" | "user" => Ok(Self::Owner),
            "category" | "kategori" => Ok(Self::Category),
            "status" | "statusbuku" => Ok(Self::Status),
            other => Err(format!(
                "unknown filter '{other}' (expected all, owner, category or status)"
            )),
        }
    }
}

/// A server-side filter on the book collection. Built only by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFilter {
    kind: FilterKind,
    segment: &'static str,
    value: String,
}

impl BookFilter {
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        self.kind
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Path below the book collection, e.g. `statusBuku/2`.
    #[must_use]
    pub fn sub_path(&self) -> String {
        format!("{}/{}", self.segment, urlencoding::encode(&self.value))
    }
}

/// What the synchronizer's collection currently represents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BookView {
    /// The complete, unfiltered collection. Only this view is persisted.
    #[default]
    Full,
    /// A server-filtered subset; never merged into the full-view cache.
    Filtered(BookFilter),
}

impl BookView {
    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for BookView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("all books"),
            Self::Filtered(filter) => write!(f, "{} = {}", filter.kind, filter.value),
        }
    }
}

/// Map a filter selection to the view that backs it.
///
/// `All`, or any kind with a blank value, is the full view.
#[must_use]
pub fn resolve(kind: FilterKind, value: &str) -> BookView {
    let value = value.trim();
    match kind.path_segment() {
        Some(segment) if !value.is_empty() => BookView::Filtered(BookFilter {
            kind,
            segment,
            value: value.to_string(),
        }),
        _ => BookView::Full,
    }
}

/// Resolve the selection and reload the synchronizer with it.
///
/// Resetting to `All` goes through `load(Full)` as well, so the displayed
/// collection is never just a UI-side reset of a filtered one.
pub async fn apply<G: EntityGateway>(
    sync: &BookSynchronizer<G>,
    kind: FilterKind,
    value: &str,
) -> FetchResult<LoadOutcome> {
    let view = resolve(kind, value);
    tracing::debug!("Applying book filter: {view}");
    sync.load(view).await
}
