//! Catalog service wrapper shared by every front end.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::credential::CredentialSource;
use crate::display::{to_display, to_display_all, DisplayBook};
use crate::error::{FetchError, FetchResult, Result};
use crate::filter::{self, FilterKind};
use crate::gateway::{EntityGateway, HttpGateway};
use crate::lookup::LookupCache;
use crate::models::{BookDraft, EntityId, LookupEntry, LookupKind};
use crate::store::SessionStore;
use crate::sync::{BookSnapshot, BookSynchronizer, LoadOutcome};

/// What `init` managed to do. Failures here are not fatal: the caches fall
/// back to whatever the session store had.
#[derive(Debug, Default)]
pub struct InitReport {
    /// Cached books were on screen before the network answered.
    pub restored_from_store: bool,
    pub lookup_failures: Vec<(LookupKind, FetchError)>,
    pub book_error: Option<FetchError>,
}

impl InitReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.lookup_failures.is_empty() && self.book_error.is_none()
    }
}

/// Lookup cache and book synchronizer over one gateway and one store.
pub struct CatalogService<G> {
    lookups: LookupCache<G>,
    books: BookSynchronizer<G>,
}

impl CatalogService<HttpGateway> {
    /// Build a service that talks to the configured REST endpoint.
    pub fn connect(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialSource>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let gateway = HttpGateway::new(config, credentials)?;
        tracing::debug!("Catalog service using {}", gateway.base_url());
        Ok(Self::new(Arc::new(gateway), store))
    }
}

impl<G: EntityGateway> CatalogService<G> {
    pub fn new(gateway: Arc<G>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            lookups: LookupCache::new(Arc::clone(&gateway), Arc::clone(&store)),
            books: BookSynchronizer::new(gateway, store),
        }
    }

    pub const fn lookups(&self) -> &LookupCache<G> {
        &self.lookups
    }

    pub const fn books(&self) -> &BookSynchronizer<G> {
        &self.books
    }

    /// Show cached books, refresh every lookup table, then load the full view.
    pub async fn init(&self) -> InitReport {
        let restored_from_store = self.books.restore_if_empty();
        let lookup_failures = self.lookups.refresh_all().await;
        let book_error = self.books.load(filter::BookView::Full).await.err();

        let report = InitReport {
            restored_from_store,
            lookup_failures,
            book_error,
        };
        if !report.is_clean() {
            tracing::warn!(
                "Catalog initialized with {} lookup failure(s), books ok: {}",
                report.lookup_failures.len(),
                report.book_error.is_none()
            );
        }
        report
    }

    pub fn snapshot(&self) -> BookSnapshot {
        self.books.snapshot()
    }

    /// Current collection joined against the current lookup tables.
    pub fn display_books(&self) -> Vec<DisplayBook> {
        let lookups = self.lookups.snapshot();
        to_display_all(&self.books.books(), &lookups)
    }

    pub async fn apply_filter(&self, kind: FilterKind, value: &str) -> FetchResult<LoadOutcome> {
        filter::apply(&self.books, kind, value).await
    }

    pub async fn reload(&self) -> FetchResult<LoadOutcome> {
        self.books.load(filter::BookView::Full).await
    }

    pub async fn create_book(&self, draft: &BookDraft) -> FetchResult<DisplayBook> {
        let book = self.books.create(draft).await?;
        Ok(to_display(&book, &self.lookups))
    }

    pub async fn update_book(&self, id: EntityId, draft: &BookDraft) -> FetchResult<DisplayBook> {
        let book = self.books.update(id, draft).await?;
        Ok(to_display(&book, &self.lookups))
    }

    pub async fn delete_book(&self, id: EntityId) -> FetchResult<()> {
        self.books.remove(id).await
    }

    pub async fn create_status(&self, name: &str) -> FetchResult<LookupEntry> {
        self.lookups.create_status(name).await
    }

    pub async fn rename_status(&self, id: EntityId, name: &str) -> FetchResult<LookupEntry> {
        self.lookups.update_status(id, name).await
    }

    pub async fn delete_status(&self, id: EntityId) -> FetchResult<()> {
        self.lookups.remove_status(id).await
    }
}
