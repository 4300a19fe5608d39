//! Scripted in-process gateway for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{FetchError, FetchResult};
use crate::filter::BookFilter;
use crate::gateway::EntityGateway;
use crate::models::{EntityId, EntityKind};

struct Scripted {
    result: FetchResult<Value>,
    gate: Option<Arc<Notify>>,
}

/// Answers each route (`"GET /buku"`, `"PUT /buku/3"`, ...) from a queue.
///
/// A route with nothing queued answers with a transport error.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, Option<Value>)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, route: &str, data: Value) {
        self.push(route, Ok(data), None);
    }

    pub fn fail(&self, route: &str, error: FetchError) {
        self.push(route, Err(error), None);
    }

    /// Hold the response until `gate` is notified.
    pub fn respond_after(&self, route: &str, data: Value, gate: Arc<Notify>) {
        self.push(route, Ok(data), Some(gate));
    }

    /// Hold the failure until `gate` is notified.
    pub fn fail_after(&self, route: &str, error: FetchError, gate: Arc<Notify>) {
        self.push(route, Err(error), Some(gate));
    }

    pub fn routes_called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(route, _)| route.clone())
            .collect()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, body)| body.clone())
    }

    fn push(&self, route: &str, result: FetchResult<Value>, gate: Option<Arc<Notify>>) {
        self.responses
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(Scripted { result, gate });
    }

    async fn answer<T: DeserializeOwned>(&self, route: String, body: Option<Value>) -> FetchResult<T> {
        self.calls.lock().unwrap().push((route.clone(), body));
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&route)
            .and_then(VecDeque::pop_front);
        let Some(scripted) = scripted else {
            return Err(FetchError::Transport(format!("no scripted response for {route}")));
        };
        if let Some(gate) = scripted.gate {
            gate.notified().await;
        }
        let value = scripted.result?;
        serde_json::from_value(value).map_err(|error| FetchError::Decode(error.to_string()))
    }
}

impl EntityGateway for ScriptedGateway {
    async fn fetch_all<T: DeserializeOwned>(&self, kind: EntityKind) -> FetchResult<Vec<T>> {
        self.answer(format!("GET {}", kind.collection_path()), None)
            .await
    }

    async fn fetch_filtered<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        filter: &BookFilter,
    ) -> FetchResult<Vec<T>> {
        self.answer(
            format!("GET {}/{}", kind.collection_path(), filter.sub_path()),
            None,
        )
        .await
    }

    async fn create<P, T>(&self, kind: EntityKind, payload: &P) -> FetchResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(payload).ok();
        self.answer(format!("POST {}", kind.collection_path()), body)
            .await
    }

    async fn update<P, T>(&self, kind: EntityKind, id: EntityId, payload: &P) -> FetchResult<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(payload).ok();
        self.answer(format!("PUT {}/{id}", kind.collection_path()), body)
            .await
    }

    async fn remove(&self, kind: EntityKind, id: EntityId) -> FetchResult<()> {
        self.answer::<Value>(format!("DELETE {}/{id}", kind.collection_path()), None)
            .await
            .map(|_| ())
    }
}

/// Service-shaped JSON for a book.
pub fn book_json(id: i64, title: &str, status_id: i64) -> Value {
    serde_json::json!({
        "id": id,
        "judul": title,
        "pengarang": "Pengarang",
        "penerbit": "Penerbit",
        "tahunTerbit": 2001,
        "statusBukuId": status_id
    })
}
