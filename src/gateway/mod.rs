//! Gateway entry points.
//!
//! Each entry point decodes its textual arguments, calls one backend
//! operation and renders the outcome as text. Nothing here returns an
//! error: malformed input and backend failures become reply strings so the
//! caller always gets something to show.

mod limits;
mod readonly;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::BackendError;
use crate::context::AppContext;

pub use limits::ResultLimits;
pub use readonly::find_disallowed_operator;

pub const INVALID_JSON: &str = "Error: Invalid JSON query format.";
pub const NOT_AN_OBJECT: &str = "Error: Query must be a JSON object.";
pub const NO_RESULTS: &str = "No results found.";

/// Text produced by an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// True when `text` describes a failure rather than a result.
    pub is_error: bool,
}

impl Reply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    fn failed(operation: &str, err: impl std::fmt::Display) -> Self {
        Self::error(format!("Error executing {}: {}", operation, err))
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Read-only entry points over an [`AppContext`].
#[derive(Clone)]
pub struct Gateway {
    context: AppContext,
    limits: ResultLimits,
}

impl Gateway {
    pub fn new(context: AppContext, limits: ResultLimits) -> Self {
        Self { context, limits }
    }

    /// Collection names, one per line.
    pub async fn list_collections(&self) -> Reply {
        match self.context.documents.list_collections().await {
            Ok(names) => Reply::ok(names.join("\n")),
            Err(err) => backend_failure("list collections", err),
        }
    }

    /// Advisory field/type map from one sampled document.
    pub async fn collection_schema(&self, collection: &str) -> Reply {
        match self.context.documents.infer_schema(collection).await {
            Ok(sample) => render("get collection schema", &sample.to_json()),
            Err(err) => backend_failure("get collection schema", err),
        }
    }

    /// Index names, one per line.
    pub async fn list_indices(&self) -> Reply {
        match self.context.search.list_indices().await {
            Ok(names) => Reply::ok(names.join("\n")),
            Err(err) => backend_failure("list indices", err),
        }
    }

    pub async fn index_mapping(&self, index: &str) -> Reply {
        match self.context.search.index_mapping(index).await {
            Ok(lookup) => render("get index mapping", &lookup.into_json()),
            Err(err) => backend_failure("get index mapping", err),
        }
    }

    /// Run a JSON filter against a collection.
    pub async fn query_collection(&self, collection: &str, query: &str, limit: Option<i64>) -> Reply {
        let filter = match decode_filter(query) {
            Ok(filter) => filter,
            Err(reply) => return reply,
        };

        if let Some(operator) = find_disallowed_operator(&filter) {
            tracing::warn!(collection, operator = %operator, "Rejected filter with disallowed operator");
            return Reply::error(format!(
                "Error: Query contains disallowed operator '{}'.",
                operator
            ));
        }

        let limit = self.limits.resolve(limit);
        tracing::debug!(collection, limit, "Executing collection query");

        match self
            .context
            .documents
            .execute_query(collection, filter, limit)
            .await
        {
            Ok(documents) if documents.is_empty() => Reply::ok(NO_RESULTS),
            Ok(documents) => render("query", &documents),
            Err(err) => backend_failure("query", err),
        }
    }

    /// Run a JSON search body against an index.
    ///
    /// A search that matches nothing returns the native zero-hit response,
    /// not [`NO_RESULTS`].
    pub async fn search_index(&self, index: &str, query: &str, size: Option<i64>) -> Reply {
        let body: Value = match serde_json::from_str(query) {
            Ok(body) => body,
            Err(_) => return Reply::error(INVALID_JSON),
        };

        let size = self.limits.resolve(size);
        tracing::debug!(index, size, "Executing index search");

        match self.context.search.search(index, body, size).await {
            Ok(lookup) => render("search", &lookup.into_json()),
            Err(err) => backend_failure("search", err),
        }
    }
}

fn decode_filter(query: &str) -> Result<Map<String, Value>, Reply> {
    match serde_json::from_str::<Value>(query) {
        Ok(Value::Object(filter)) => Ok(filter),
        Ok(_) => Err(Reply::error(NOT_AN_OBJECT)),
        Err(_) => Err(Reply::error(INVALID_JSON)),
    }
}

fn render<T: Serialize + ?Sized>(operation: &str, value: &T) -> Reply {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Reply::ok(text),
        Err(err) => Reply::failed(operation, err),
    }
}

fn backend_failure(operation: &str, err: BackendError) -> Reply {
    tracing::warn!(
        operation,
        error_type = err.error_type(),
        error = %err,
        "Gateway operation failed"
    );
    Reply::failed(operation, err)
}
