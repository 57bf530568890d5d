//! In-memory backends implementing the handle traits.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use mongosearch_mcp::backend::{
    BackendError, DocumentStore, Lifecycle, Lookup, SchemaSample, SearchIndex,
};

/// Connection bookkeeping shared by both fakes.
#[derive(Default)]
pub struct Counters {
    connected: AtomicBool,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn ensure(&self, backend: &'static str, fail: bool) -> Result<(), BackendError> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        if fail {
            return Err(BackendError::connection(backend, "connection refused"));
        }
        self.connected.store(true, Ordering::SeqCst);
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn release(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Document store holding collections in memory.
///
/// Filters match on top-level equality; operator keys are ignored.
#[derive(Default)]
pub struct FakeDocumentStore {
    pub counters: Counters,
    collections: BTreeMap<String, Vec<Value>>,
    fail_connect: bool,
    fail_queries: Option<String>,
    query_delay: Option<Duration>,
    pub last_limit: Mutex<Option<u64>>,
    pub last_filter: Mutex<Option<Map<String, Value>>>,
}

impl FakeDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: &str, documents: Vec<Value>) -> Self {
        self.collections.insert(name.to_string(), documents);
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_queries(mut self, message: &str) -> Self {
        self.fail_queries = Some(message.to_string());
        self
    }

    pub fn with_query_delay(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    fn check_query(&self, operation: &'static str) -> Result<(), BackendError> {
        self.counters.ensure("MongoDB", self.fail_connect)?;
        match &self.fail_queries {
            Some(message) => Err(BackendError::query("MongoDB", operation, message)),
            None => Ok(()),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches(document: &Value, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .filter(|(key, value)| !key.starts_with('$') && !value.is_object())
        .all(|(key, value)| document.get(key) == Some(value))
}

#[async_trait]
impl Lifecycle for FakeDocumentStore {
    fn name(&self) -> &'static str {
        "MongoDB"
    }

    async fn connect(&self) -> Result<(), BackendError> {
        self.counters.ensure("MongoDB", self.fail_connect)
    }

    async fn disconnect(&self) {
        self.counters.disconnect();
    }

    async fn is_connected(&self) -> bool {
        self.counters.is_connected()
    }

    fn release_now(&self) {
        self.counters.release();
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>, BackendError> {
        self.check_query("listCollections")?;
        Ok(self.collections.keys().cloned().collect())
    }

    async fn infer_schema(&self, collection: &str) -> Result<SchemaSample, BackendError> {
        self.check_query("findOne")?;
        let first = self
            .collections
            .get(collection)
            .and_then(|documents| documents.first())
            .and_then(Value::as_object);

        Ok(match first {
            None => SchemaSample::Empty,
            Some(document) => SchemaSample::Fields(
                document
                    .iter()
                    .map(|(key, value)| (key.clone(), json_type_name(value).to_string()))
                    .collect(),
            ),
        })
    }

    async fn execute_query(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: u64,
    ) -> Result<Vec<Value>, BackendError> {
        self.check_query("find")?;
        if let Some(delay) = self.query_delay {
            tokio::time::sleep(delay).await;
        }

        *self.last_limit.lock() = Some(limit);
        let found = self
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| matches(document, &filter))
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        *self.last_filter.lock() = Some(filter);
        Ok(found)
    }
}

/// Search cluster holding index mappings and canned hits in memory.
#[derive(Default)]
pub struct FakeSearchIndex {
    pub counters: Counters,
    indices: BTreeMap<String, (Value, Vec<Value>)>,
    fail_connect: bool,
    pub last_size: Mutex<Option<u64>>,
    pub last_body: Mutex<Option<Value>>,
}

impl FakeSearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, name: &str, mapping: Value, hits: Vec<Value>) -> Self {
        self.indices.insert(name.to_string(), (mapping, hits));
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }
}

#[async_trait]
impl Lifecycle for FakeSearchIndex {
    fn name(&self) -> &'static str {
        "OpenSearch"
    }

    async fn connect(&self) -> Result<(), BackendError> {
        self.counters.ensure("OpenSearch", self.fail_connect)
    }

    async fn disconnect(&self) {
        self.counters.disconnect();
    }

    async fn is_connected(&self) -> bool {
        self.counters.is_connected()
    }

    fn release_now(&self) {
        self.counters.release();
    }
}

#[async_trait]
impl SearchIndex for FakeSearchIndex {
    async fn list_indices(&self) -> Result<Vec<String>, BackendError> {
        self.counters.ensure("OpenSearch", self.fail_connect)?;
        Ok(self.indices.keys().cloned().collect())
    }

    async fn index_mapping(&self, index: &str) -> Result<Lookup, BackendError> {
        self.counters.ensure("OpenSearch", self.fail_connect)?;
        Ok(match self.indices.get(index) {
            Some((mapping, _)) => {
                let mut response = Map::new();
                response.insert(index.to_string(), json!({ "mappings": mapping }));
                Lookup::Found(Value::Object(response))
            }
            None => Lookup::NotFound(index.to_string()),
        })
    }

    async fn search(&self, index: &str, body: Value, size: u64) -> Result<Lookup, BackendError> {
        self.counters.ensure("OpenSearch", self.fail_connect)?;
        *self.last_size.lock() = Some(size);
        *self.last_body.lock() = Some(body);

        Ok(match self.indices.get(index) {
            Some((_, hits)) => {
                let hits: Vec<Value> = hits.iter().take(size as usize).cloned().collect();
                Lookup::Found(json!({
                    "took": 1,
                    "timed_out": false,
                    "hits": {
                        "total": { "value": hits.len(), "relation": "eq" },
                        "hits": hits
                    }
                }))
            }
            None => Lookup::NotFound(index.to_string()),
        })
    }
}
