//! Document-store handle backed by the MongoDB driver.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use serde_json::{Map, Value};

use super::error::BackendError;
use super::state::ConnectionSlot;
use super::{DocumentStore, Lifecycle, SchemaSample};
use crate::config::{redact_uri, MongoConfig};

const BACKEND: &str = "MongoDB";

#[derive(Clone)]
struct MongoConnection {
    client: Client,
    database: Database,
}

/// Handle to one MongoDB database.
///
/// The client is created on `connect()` or on first use by any read
/// operation, and closed on `disconnect()`.
pub struct MongoHandle {
    config: MongoConfig,
    slot: ConnectionSlot<MongoConnection>,
}

impl MongoHandle {
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            slot: ConnectionSlot::new(BACKEND),
        }
    }

    async fn ensure_connected(&self) -> Result<MongoConnection, BackendError> {
        self.slot.ensure(|| open(&self.config)).await
    }
}

async fn open(config: &MongoConfig) -> Result<MongoConnection, BackendError> {
    tracing::debug!(
        uri = %redact_uri(&config.uri),
        database = %config.database,
        "Opening MongoDB client"
    );

    let mut options = ClientOptions::parse(&config.uri)
        .await
        .map_err(|e| BackendError::connection(BACKEND, e))?;
    options.app_name = Some(config.app_name.clone());
    options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout_seconds));

    let client =
        Client::with_options(options).map_err(|e| BackendError::connection(BACKEND, e))?;
    let database = client.database(&config.database);

    // The driver connects lazily; ping so a bad URI or dead server fails here.
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| BackendError::connection(BACKEND, e))?;

    Ok(MongoConnection { client, database })
}

#[async_trait]
impl Lifecycle for MongoHandle {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<(), BackendError> {
        self.ensure_connected().await.map(|_| ())
    }

    async fn disconnect(&self) {
        if let Some(connection) = self.slot.take().await {
            connection.client.shutdown().await;
        }
    }

    async fn is_connected(&self) -> bool {
        self.slot.is_connected().await
    }

    fn release_now(&self) {
        self.slot.release_now();
    }
}

#[async_trait]
impl DocumentStore for MongoHandle {
    async fn list_collections(&self) -> Result<Vec<String>, BackendError> {
        let connection = self.ensure_connected().await?;
        connection
            .database
            .list_collection_names()
            .await
            .map_err(|e| BackendError::query(BACKEND, "listCollections", e))
    }

    async fn infer_schema(&self, collection: &str) -> Result<SchemaSample, BackendError> {
        let connection = self.ensure_connected().await?;
        let sample = connection
            .database
            .collection::<Document>(collection)
            .find_one(doc! {})
            .await
            .map_err(|e| BackendError::query(BACKEND, "findOne", e))?;

        Ok(match sample {
            None => SchemaSample::Empty,
            Some(document) => sample_fields(&document),
        })
    }

    async fn execute_query(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: u64,
    ) -> Result<Vec<Value>, BackendError> {
        let filter = filter_to_document(filter)?;
        let connection = self.ensure_connected().await?;

        let cursor = connection
            .database
            .collection::<Document>(collection)
            .find(filter)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(|e| BackendError::query(BACKEND, "find", e))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| BackendError::query(BACKEND, "find", e))?;

        Ok(documents.into_iter().map(render_document).collect())
    }
}

/// Relaxed extended JSON: plain numbers where they fit, `$oid`/`$date`
/// wrappers for the rest.
fn render_document(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

/// Convert a JSON filter into a BSON document.
///
/// Extended JSON wrappers such as `{"$oid": ...}` or `{"$date": ...}` are
/// decoded into their BSON types.
fn filter_to_document(filter: Map<String, Value>) -> Result<Document, BackendError> {
    match Bson::try_from(Value::Object(filter)) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(BackendError::InvalidRequest(format!(
            "filter decoded to {} instead of a document",
            bson_type_name(&other)
        ))),
        Err(e) => Err(BackendError::InvalidRequest(e.to_string())),
    }
}

fn sample_fields(document: &Document) -> SchemaSample {
    SchemaSample::Fields(
        document
            .iter()
            .map(|(key, value)| (key.clone(), bson_type_name(value).to_string()))
            .collect(),
    )
}

/// Type alias of a BSON value, as used by the `$type` query operator.
pub fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::JavaScriptCodeWithScope(_) => "javascriptWithScope",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}
