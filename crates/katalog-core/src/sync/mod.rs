//! Book cache synchronizer.
//!
//! Owns the in-memory book collection. Every change is confirmed by the
//! service first and then applied by swapping in a new `Arc<Vec<Book>>`, so a
//! reader holding the previous snapshot never sees a half-applied splice.
//!
//! Only the full view is written to the durable store (`booksData`).
//! Filtered results live in memory only and never overwrite that envelope.
//!
//! Mutations for the same id are applied in the order their responses
//! arrive. Two views editing one book concurrently are not reconciled here:
//! the last write the server accepted wins, and a stale view catches up on
//! its next `load`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchResult;
use crate::filter::BookView;
use crate::gateway::EntityGateway;
use crate::models::{Book, BookDraft, EntityId, EntityKind};
use crate::state::{DataSource, SyncPhase};
use crate::store::{read_json, write_json, SessionStore};

/// Durable store key for the full-view envelope.
pub const BOOKS_KEY: &str = "booksData";

/// Persisted full-view collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    pub collection: Vec<Book>,
    /// `None` only for snapshots written in the older bare-array layout.
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBooks {
    Envelope(CacheEnvelope),
    Bare(Vec<Book>),
}

impl From<StoredBooks> for CacheEnvelope {
    fn from(stored: StoredBooks) -> Self {
        match stored {
            StoredBooks::Envelope(envelope) => envelope,
            StoredBooks::Bare(collection) => Self {
                collection,
                fetched_at: None,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRef<'a> {
    collection: &'a [Book],
    fetched_at: DateTime<Utc>,
}

/// What happened to a `load` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the collection.
    Applied,
    /// A newer `load` was issued meanwhile; this response, success or
    /// failure, was dropped without touching the collection.
    Superseded,
}

/// Consistent read of the synchronizer's state.
#[derive(Debug, Clone)]
pub struct BookSnapshot {
    pub books: Arc<Vec<Book>>,
    pub view: BookView,
    pub source: DataSource,
    pub phase: SyncPhase,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    books: Arc<Vec<Book>>,
    view: BookView,
    source: DataSource,
    fetched_at: Option<DateTime<Utc>>,
    /// The collection represents a loaded or restored view.
    populated: bool,
    loads_in_flight: usize,
    mutations_in_flight: usize,
}

impl Inner {
    const fn phase(&self) -> SyncPhase {
        if self.loads_in_flight > 0 {
            SyncPhase::Loading
        } else if self.mutations_in_flight > 0 {
            SyncPhase::Mutating
        } else if self.populated {
            SyncPhase::Ready
        } else {
            SyncPhase::Empty
        }
    }

    fn install(&mut self, books: Vec<Book>, view: BookView, source: DataSource, fetched_at: Option<DateTime<Utc>>) {
        self.books = Arc::new(books);
        self.view = view;
        self.source = source;
        self.fetched_at = fetched_at;
        self.populated = true;
    }
}

#[derive(Clone, Copy)]
enum Operation {
    Load,
    Mutation,
}

/// Keeps the in-flight counters right even if the caller drops the future.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    operation: Operation,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match self.operation {
            Operation::Load => inner.loads_in_flight -= 1,
            Operation::Mutation => inner.mutations_in_flight -= 1,
        }
    }
}

pub struct BookSynchronizer<G> {
    gateway: Arc<G>,
    store: Arc<dyn SessionStore>,
    load_sequence: AtomicU64,
    inner: Mutex<Inner>,
}

impl<G: EntityGateway> BookSynchronizer<G> {
    pub fn new(gateway: Arc<G>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            gateway,
            store,
            load_sequence: AtomicU64::new(0),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn snapshot(&self) -> BookSnapshot {
        let inner = self.lock();
        BookSnapshot {
            books: Arc::clone(&inner.books),
            view: inner.view.clone(),
            source: inner.source,
            phase: inner.phase(),
            fetched_at: inner.fetched_at,
        }
    }

    pub fn books(&self) -> Arc<Vec<Book>> {
        Arc::clone(&self.lock().books)
    }

    pub fn phase(&self) -> SyncPhase {
        self.lock().phase()
    }

    /// Fetch `view` and make it the current collection.
    ///
    /// Only the most recently issued load may change state. An older
    /// response is dropped as `Superseded`, even when the newer load has
    /// failed or is still in flight. When the newest full-view load fails
    /// while the collection is empty, the durable envelope is installed
    /// (marked cached) before the error is returned. Filtered failures never
    /// fall back to it.
    pub async fn load(&self, view: BookView) -> FetchResult<LoadOutcome> {
        let sequence = self.load_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = self.begin(Operation::Load);

        let result = match &view {
            BookView::Full => self.gateway.fetch_all::<Book>(EntityKind::Book).await,
            BookView::Filtered(filter) => {
                self.gateway
                    .fetch_filtered::<Book>(EntityKind::Book, filter)
                    .await
            }
        };

        let mut inner = self.lock();
        let latest = self.load_sequence.load(Ordering::SeqCst);
        if sequence < latest {
            match &result {
                Ok(_) => tracing::debug!("Dropping stale book load #{sequence} ({view}); #{latest} issued since"),
                Err(error) => tracing::debug!("Ignoring failure of stale book load #{sequence} ({view}): {error}"),
            }
            return Ok(LoadOutcome::Superseded);
        }
        match result {
            Ok(books) => {
                let books = dedupe_by_id(books);
                tracing::info!("Loaded {} books ({view})", books.len());
                inner.install(books, view, DataSource::Live, Some(Utc::now()));
                self.persist_if_full(&inner);
                Ok(LoadOutcome::Applied)
            }
            Err(error) => {
                tracing::warn!("Book load #{sequence} ({view}) failed: {error}");
                if view.is_full() && inner.books.is_empty() {
                    if let Some(envelope) = self.restore_from_envelope() {
                        tracing::warn!(
                            "Showing {} cached books after failed load",
                            envelope.collection.len()
                        );
                        inner.install(
                            envelope.collection,
                            BookView::Full,
                            DataSource::Cached,
                            envelope.fetched_at,
                        );
                    }
                }
                Err(error)
            }
        }
    }

    /// Create a book remotely, then append the server's copy.
    ///
    /// Nothing is inserted locally before the server confirms.
    pub async fn create(&self, draft: &BookDraft) -> FetchResult<Book> {
        let _in_flight = self.begin(Operation::Mutation);
        let book: Book = self
            .gateway
            .create(EntityKind::Book, draft)
            .await
            .inspect_err(|error| tracing::warn!("Book create failed: {error}"))?;

        tracing::info!("Created book {}", book.id);
        self.commit(|books, _| upsert(books, book.clone()));
        Ok(book)
    }

    /// Update a book remotely, then replace the local row with the server's copy.
    pub async fn update(&self, id: EntityId, draft: &BookDraft) -> FetchResult<Book> {
        let _in_flight = self.begin(Operation::Mutation);
        let book: Book = self
            .gateway
            .update(EntityKind::Book, id, draft)
            .await
            .inspect_err(|error| tracing::warn!("Book update {id} failed: {error}"))?;

        tracing::info!("Updated book {id}");
        self.commit(|books, view| {
            match books.iter().position(|existing| existing.id == id) {
                Some(position) => {
                    books[position] = book.clone();
                    dedupe_in_place(books);
                }
                // Absent from the full view means the local copy is behind.
                None if view.is_full() => upsert(books, book.clone()),
                None => {}
            }
        });
        Ok(book)
    }

    /// Delete a book remotely; the local row goes only after the server agrees.
    pub async fn remove(&self, id: EntityId) -> FetchResult<()> {
        let _in_flight = self.begin(Operation::Mutation);
        self.gateway
            .remove(EntityKind::Book, id)
            .await
            .inspect_err(|error| tracing::warn!("Book delete {id} failed: {error}"))?;

        tracing::info!("Deleted book {id}");
        self.commit(|books, _| books.retain(|existing| existing.id != id));
        Ok(())
    }

    /// Read the durable full-view envelope, if one exists and decodes.
    pub fn restore_from_envelope(&self) -> Option<CacheEnvelope> {
        match read_json::<StoredBooks>(self.store.as_ref(), BOOKS_KEY) {
            Ok(stored) => stored.map(CacheEnvelope::from),
            Err(error) => {
                tracing::warn!("Ignoring unreadable {BOOKS_KEY} snapshot: {error}");
                None
            }
        }
    }

    /// On (re)entry: show the durable envelope if nothing is loaded yet.
    ///
    /// Returns whether cached books were installed.
    pub fn restore_if_empty(&self) -> bool {
        let mut inner = self.lock();
        if inner.populated || !inner.books.is_empty() {
            return false;
        }
        let Some(envelope) = self.restore_from_envelope() else {
            return false;
        };
        tracing::debug!("Restored {} books from session store", envelope.collection.len());
        inner.install(
            envelope.collection,
            BookView::Full,
            DataSource::Cached,
            envelope.fetched_at,
        );
        true
    }

    fn commit(&self, change: impl FnOnce(&mut Vec<Book>, &BookView)) {
        let mut inner = self.lock();
        let mut books = inner.books.as_ref().clone();
        change(&mut books, &inner.view);
        inner.books = Arc::new(books);
        self.persist_if_full(&inner);
    }

    /// Write the envelope while the lock is held, so envelope and memory
    /// cannot be reordered by two overlapping commits.
    fn persist_if_full(&self, inner: &Inner) {
        if !inner.view.is_full() || !inner.populated {
            return;
        }
        let envelope = EnvelopeRef {
            collection: inner.books.as_slice(),
            fetched_at: inner.fetched_at.unwrap_or_else(Utc::now),
        };
        if let Err(error) = write_json(self.store.as_ref(), BOOKS_KEY, &envelope) {
            tracing::warn!("Failed to persist {BOOKS_KEY}: {error}");
        }
    }

    fn begin(&self, operation: Operation) -> InFlight<'_> {
        let mut inner = self.lock();
        match operation {
            Operation::Load => inner.loads_in_flight += 1,
            Operation::Mutation => inner.mutations_in_flight += 1,
        }
        InFlight {
            inner: &self.inner,
            operation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upsert(books: &mut Vec<Book>, book: Book) {
    match books.iter_mut().find(|existing| existing.id == book.id) {
        Some(slot) => *slot = book,
        None => books.push(book),
    }
}

/// Keep one row per id (the last one seen), in first-seen order.
fn dedupe_by_id(books: Vec<Book>) -> Vec<Book> {
    let mut positions: HashMap<EntityId, usize> = HashMap::with_capacity(books.len());
    let mut unique: Vec<Book> = Vec::with_capacity(books.len());
    for book in books {
        if let Some(&position) = positions.get(&book.id) {
            tracing::warn!("Service returned book {} more than once", book.id);
            unique[position] = book;
        } else {
            positions.insert(book.id, unique.len());
            unique.push(book);
        }
    }
    unique
}

fn dedupe_in_place(books: &mut Vec<Book>) {
    let deduped = dedupe_by_id(std::mem::take(books));
    *books = deduped;
}
