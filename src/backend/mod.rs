//! Backend connection handles.
//!
//! One handle per external system. Each owns a lazily established client
//! and exposes the read primitives the gateway needs. The traits are the
//! seam between the gateway and the concrete drivers.

mod error;
pub mod mongo;
pub mod opensearch;
mod state;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub use error::BackendError;
pub use mongo::MongoHandle;
pub use opensearch::OpenSearchHandle;
pub use state::ConnectionSlot;

/// Connect/disconnect contract shared by every handle.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Returns the backend name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Establish the client if unconnected. No-op when already connected.
    async fn connect(&self) -> Result<(), BackendError>;

    /// Release the client if connected. Safe to call repeatedly.
    async fn disconnect(&self);

    async fn is_connected(&self) -> bool;

    /// Drop the client synchronously, without the graceful close.
    fn release_now(&self);
}

/// Read primitives of the document store.
#[async_trait]
pub trait DocumentStore: Lifecycle {
    /// Names of the collections in the selected database.
    async fn list_collections(&self) -> Result<Vec<String>, BackendError>;

    /// Field-to-type map taken from one sampled document.
    ///
    /// Advisory only: other documents in the collection may differ.
    async fn infer_schema(&self, collection: &str) -> Result<SchemaSample, BackendError>;

    /// Run `filter` against `collection`, returning at most `limit` documents.
    async fn execute_query(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: u64,
    ) -> Result<Vec<Value>, BackendError>;
}

/// Read primitives of the search cluster.
#[async_trait]
pub trait SearchIndex: Lifecycle {
    /// Names of all indices matching the `*` pattern.
    async fn list_indices(&self) -> Result<Vec<String>, BackendError>;

    async fn index_mapping(&self, index: &str) -> Result<Lookup, BackendError>;

    /// Execute `body` against `index`; the native response is returned untouched.
    async fn search(&self, index: &str, body: Value, size: u64) -> Result<Lookup, BackendError>;
}

/// Outcome of a schema sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaSample {
    /// The collection has no documents to sample.
    Empty,
    /// Top-level fields in document order with their type names.
    Fields(Vec<(String, String)>),
}

impl SchemaSample {
    pub fn to_json(&self) -> Value {
        match self {
            SchemaSample::Empty => json!({ "error": "No documents found in collection" }),
            SchemaSample::Fields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, kind)| (name.clone(), Value::String(kind.clone())))
                    .collect(),
            ),
        }
    }
}

/// Result of an index-scoped call that may hit a missing index.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    /// The named index does not exist.
    NotFound(String),
}

impl Lookup {
    pub fn into_json(self) -> Value {
        match self {
            Lookup::Found(value) => value,
            Lookup::NotFound(index) => json!({ "error": format!("Index {} not found", index) }),
        }
    }
}
