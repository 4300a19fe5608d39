//! Reference-data cache for statuses, categories and users.
//!
//! Lookups are refreshed once at mount, not on every book fetch. Joining
//! books against slightly stale reference data is accepted; `source()`
//! reports when a table came from the durable snapshot instead of the
//! service.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::display::LookupResolver;
use crate::error::{FetchError, FetchResult};
use crate::gateway::EntityGateway;
use crate::models::{EntityId, EntityKind, LookupEntry, LookupKind};
use crate::state::DataSource;
use crate::store::{read_json, write_json, SessionStore};

/// One lookup collection with an id index for O(1) resolution.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: Vec<LookupEntry>,
    index: HashMap<EntityId, usize>,
    source: DataSource,
}

impl LookupTable {
    #[must_use]
    pub fn new(entries: Vec<LookupEntry>, source: DataSource) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id, position))
            .collect();
        Self {
            entries,
            index,
            source,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[LookupEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&LookupEntry> {
        self.index.get(&id).map(|&position| &self.entries[position])
    }

    #[must_use]
    pub const fn source(&self) -> DataSource {
        self.source
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Point-in-time view over every lookup table.
///
/// Holding a snapshot keeps a render pass consistent even if a refresh
/// lands halfway through it.
#[derive(Debug, Clone, Default)]
pub struct LookupSnapshot {
    tables: HashMap<LookupKind, Arc<LookupTable>>,
}

impl LookupSnapshot {
    /// Build a snapshot from plain entry lists, marked live.
    #[must_use]
    pub fn from_entries(tables: impl IntoIterator<Item = (LookupKind, Vec<LookupEntry>)>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(kind, entries)| {
                    (kind, Arc::new(LookupTable::new(entries, DataSource::Live)))
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn table(&self, kind: LookupKind) -> Option<&LookupTable> {
        self.tables.get(&kind).map(AsRef::as_ref)
    }
}

impl LookupResolver for LookupSnapshot {
    fn resolve_name(&self, kind: LookupKind, id: EntityId) -> Option<String> {
        self.table(kind)
            .and_then(|table| table.get(id))
            .map(|entry| entry.name.clone())
    }
}

pub struct LookupCache<G> {
    gateway: Arc<G>,
    store: Arc<dyn SessionStore>,
    tables: RwLock<HashMap<LookupKind, Arc<LookupTable>>>,
}

impl<G: EntityGateway> LookupCache<G> {
    pub fn new(gateway: Arc<G>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            gateway,
            store,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Current table for `kind`; empty before the first load.
    pub fn get(&self, kind: LookupKind) -> Arc<LookupTable> {
        self.read_tables()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Pure lookup over what is cached. Never touches the network.
    pub fn resolve(&self, kind: LookupKind, id: EntityId) -> Option<LookupEntry> {
        self.read_tables()
            .get(&kind)
            .and_then(|table| table.get(id).cloned())
    }

    pub fn source(&self, kind: LookupKind) -> DataSource {
        self.read_tables()
            .get(&kind)
            .map_or(DataSource::Unloaded, |table| table.source())
    }

    pub fn snapshot(&self) -> LookupSnapshot {
        LookupSnapshot {
            tables: self.read_tables().clone(),
        }
    }

    /// Fetch `kind` from the service, falling back to the durable snapshot.
    ///
    /// On failure the fallback (or an empty table) is installed and the
    /// error is still returned so the caller can surface it.
    pub async fn refresh(&self, kind: LookupKind) -> FetchResult<()> {
        match self
            .gateway
            .fetch_all::<LookupEntry>(kind.entity_kind())
            .await
        {
            Ok(entries) => {
                tracing::debug!("Fetched {} {kind} entries", entries.len());
                self.persist(kind, &entries);
                self.install(kind, LookupTable::new(entries, DataSource::Live));
                Ok(())
            }
            Err(error) => {
                match self.restore(kind) {
                    Some(entries) => {
                        tracing::warn!(
                            "Failed to refresh {kind} lookups ({error}); using {} cached entries",
                            entries.len()
                        );
                        self.install(kind, LookupTable::new(entries, DataSource::Cached));
                    }
                    None => {
                        tracing::warn!("Failed to refresh {kind} lookups ({error}); none cached");
                        self.install(kind, LookupTable::default());
                    }
                }
                Err(error)
            }
        }
    }

    /// Refresh every lookup kind. Returns the kinds that failed.
    pub async fn refresh_all(&self) -> Vec<(LookupKind, FetchError)> {
        let mut failures = Vec::new();
        for kind in LookupKind::ALL {
            if let Err(error) = self.refresh(kind).await {
                failures.push((kind, error));
            }
        }
        failures
    }

    /// Refresh `kind` only if it has never been loaded this session.
    pub async fn ensure_loaded(&self, kind: LookupKind) -> FetchResult<()> {
        if self.source(kind) == DataSource::Unloaded {
            self.refresh(kind).await
        } else {
            Ok(())
        }
    }

    /// Forget the in-memory table so the next `ensure_loaded` refetches.
    pub fn invalidate(&self, kind: LookupKind) {
        tracing::debug!("Invalidating {kind} lookups");
        self.write_tables().remove(&kind);
    }

    pub async fn create_status(&self, name: &str) -> FetchResult<LookupEntry> {
        let payload = serde_json::json!({ "nama": name.trim() });
        let entry: LookupEntry = self.gateway.create(EntityKind::Status, &payload).await?;
        self.reconcile(LookupKind::Status, |entries| {
            upsert(entries, entry.clone());
        });
        Ok(entry)
    }

    pub async fn update_status(&self, id: EntityId, name: &str) -> FetchResult<LookupEntry> {
        let payload = serde_json::json!({ "nama": name.trim() });
        let entry: LookupEntry = self
            .gateway
            .update(EntityKind::Status, id, &payload)
            .await?;
        self.reconcile(LookupKind::Status, |entries| {
            match entries.iter().position(|existing| existing.id == id) {
                Some(position) => entries[position] = entry.clone(),
                None => upsert(entries, entry.clone()),
            }
        });
        Ok(entry)
    }

    pub async fn remove_status(&self, id: EntityId) -> FetchResult<()> {
        self.gateway.remove(EntityKind::Status, id).await?;
        self.reconcile(LookupKind::Status, |entries| {
            entries.retain(|existing| existing.id != id);
        });
        Ok(())
    }

    /// Apply a server-confirmed change to a loaded table and re-persist it.
    ///
    /// An unloaded table is left alone; the next refresh picks the change up.
    fn reconcile(&self, kind: LookupKind, change: impl FnOnce(&mut Vec<LookupEntry>)) {
        let mut tables = self.write_tables();
        let Some(current) = tables.get(&kind) else {
            return;
        };
        let mut entries = current.entries().to_vec();
        let source = current.source();
        change(&mut entries);
        self.persist(kind, &entries);
        tables.insert(kind, Arc::new(LookupTable::new(entries, source)));
    }

    fn install(&self, kind: LookupKind, table: LookupTable) {
        self.write_tables().insert(kind, Arc::new(table));
    }

    fn persist(&self, kind: LookupKind, entries: &[LookupEntry]) {
        if let Err(error) = write_json(self.store.as_ref(), kind.storage_key(), entries) {
            tracing::warn!("Failed to persist {kind} lookups: {error}");
        }
    }

    fn restore(&self, kind: LookupKind) -> Option<Vec<LookupEntry>> {
        read_json(self.store.as_ref(), kind.storage_key()).unwrap_or_else(|error| {
            tracing::warn!("Ignoring unreadable {kind} snapshot: {error}");
            None
        })
    }

    fn read_tables(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<LookupKind, Arc<LookupTable>>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tables(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<LookupKind, Arc<LookupTable>>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<G: EntityGateway> LookupResolver for LookupCache<G> {
    fn resolve_name(&self, kind: LookupKind, id: EntityId) -> Option<String> {
        self.resolve(kind, id).map(|entry| entry.name)
    }
}

fn upsert(entries: &mut Vec<LookupEntry>, entry: LookupEntry) {
    match entries.iter_mut().find(|existing| existing.id == entry.id) {
        Some(slot) => *slot = entry,
        None => entries.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use crate::testing::ScriptedGateway;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cache() -> (Arc<ScriptedGateway>, Arc<MemorySessionStore>, LookupCache<ScriptedGateway>) {
        let gateway = Arc::new(ScriptedGateway::new());
        let store = Arc::new(MemorySessionStore::new());
        let lookups = LookupCache::new(gateway.clone(), store.clone());
        (gateway, store, lookups)
    }

    #[tokio::test]
    async fn refresh_replaces_table_and_persists_it() {
        let (gateway, store, lookups) = cache();
        gateway.respond(
            "GET /statusBuku",
            json!([{"id": 1, "nama": "Tersedia"}, {"id": 2, "nama": "Dipinjam"}]),
        );

        lookups.refresh(LookupKind::Status).await.unwrap();

        assert_eq!(lookups.source(LookupKind::Status), DataSource::Live);
        assert_eq!(
            lookups.resolve(LookupKind::Status, EntityId::new(2)),
            Some(LookupEntry::new(2, "Dipinjam"))
        );
        let persisted: Vec<LookupEntry> = read_json(store.as_ref(), "statusOptions")
            .unwrap()
            .unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_durable_snapshot() {
        let (gateway, store, lookups) = cache();
        write_json(
            store.as_ref(),
            "statusOptions",
            &vec![LookupEntry::new(1, "Tersedia")],
        )
        .unwrap();
        gateway.fail(
            "GET /statusBuku",
            FetchError::Transport("connection refused".to_string()),
        );

        let result = lookups.refresh(LookupKind::Status).await;

        assert!(matches!(result, Err(FetchError::Transport(_))));
        assert_eq!(lookups.source(LookupKind::Status), DataSource::Cached);
        assert_eq!(
            lookups.resolve_name(LookupKind::Status, EntityId::new(1)),
            Some("Tersedia".to_string())
        );
    }

    #[tokio::test]
    async fn failed_refresh_without_snapshot_leaves_table_empty() {
        let (gateway, _store, lookups) = cache();
        gateway.fail(
            "GET /kategori",
            FetchError::Application {
                status: 500,
                message: "boom".to_string(),
            },
        );

        assert!(lookups.refresh(LookupKind::Category).await.is_err());
        assert!(lookups.get(LookupKind::Category).is_empty());
    }

    #[tokio::test]
    async fn ensure_loaded_fetches_once_until_invalidated() {
        let (gateway, _store, lookups) = cache();
        gateway.respond("GET /user", json!([{"id": 9, "nama": "sari"}]));
        gateway.respond("GET /user", json!([{"id": 9, "nama": "sari w."}]));

        lookups.ensure_loaded(LookupKind::User).await.unwrap();
        lookups.ensure_loaded(LookupKind::User).await.unwrap();
        assert_eq!(gateway.routes_called(), vec!["GET /user"]);

        lookups.invalidate(LookupKind::User);
        assert_eq!(lookups.source(LookupKind::User), DataSource::Unloaded);
        lookups.ensure_loaded(LookupKind::User).await.unwrap();
        assert_eq!(
            lookups.resolve_name(LookupKind::User, EntityId::new(9)),
            Some("sari w.".to_string())
        );
    }

    #[tokio::test]
    async fn refresh_all_reports_each_failure() {
        let (gateway, _store, lookups) = cache();
        gateway.respond("GET /statusBuku", json!([]));
        gateway.respond("GET /user", json!([]));

        let failures = lookups.refresh_all().await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, LookupKind::Category);
    }

    #[tokio::test]
    async fn status_mutations_use_server_representation() {
        let (gateway, store, lookups) = cache();
        gateway.respond("GET /statusBuku", json!([{"id": 1, "nama": "Tersedia"}]));
        gateway.respond("POST /statusBuku", json!({"id": 3, "nama": "Rusak"}));
        gateway.respond("PUT /statusBuku/1", json!({"id": 1, "nama": "Ada"}));
        lookups.refresh(LookupKind::Status).await.unwrap();

        lookups.create_status(" Rusak ").await.unwrap();
        assert_eq!(gateway.last_body(), Some(json!({"nama": "Rusak"})));
        lookups.update_status(EntityId::new(1), "ada").await.unwrap();

        let names = lookups
            .get(LookupKind::Status)
            .entries()
            .iter()
            .map(|entry| entry.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Ada".to_string(), "Rusak".to_string()]);

        let persisted: Vec<LookupEntry> = read_json(store.as_ref(), "statusOptions")
            .unwrap()
            .unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[tokio::test]
    async fn failed_status_delete_keeps_row() {
        let (gateway, _store, lookups) = cache();
        gateway.respond("GET /statusBuku", json!([{"id": 1, "nama": "Tersedia"}]));
        gateway.fail(
            "DELETE /statusBuku/1",
            FetchError::Application {
                status: 409,
                message: "Status masih dipakai".to_string(),
            },
        );
        lookups.refresh(LookupKind::Status).await.unwrap();

        assert!(lookups.remove_status(EntityId::new(1)).await.is_err());
        assert!(lookups
            .resolve(LookupKind::Status, EntityId::new(1))
            .is_some());
    }
}
