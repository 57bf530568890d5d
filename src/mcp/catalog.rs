//! Tool and resource catalog exposed over MCP.

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{json, Value};

pub const TOOL_QUERY_MONGODB: &str = "query_mongodb";
pub const TOOL_SEARCH_OPENSEARCH: &str = "search_opensearch";

pub const URI_COLLECTIONS: &str = "mongodb://collections";
pub const URI_INDICES: &str = "opensearch://indices";
const MONGODB_SCHEME: &str = "mongodb://";
const OPENSEARCH_SCHEME: &str = "opensearch://";
const SCHEMA_SUFFIX: &str = "/schema";
const MAPPING_SUFFIX: &str = "/mapping";

/// `tools/list` entries.
pub fn tool_definitions() -> Value {
    json!([
        {
            "name": TOOL_QUERY_MONGODB,
            "description": "Query a MongoDB collection with a read-only filter query.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "The name of the collection to query"
                    },
                    "query": {
                        "type": "string",
                        "description": "A JSON string representing a MongoDB query filter"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default: 100)",
                        "default": 100
                    }
                },
                "required": ["collection", "query"]
            }
        },
        {
            "name": TOOL_SEARCH_OPENSEARCH,
            "description": "Search an OpenSearch index.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "index": {
                        "type": "string",
                        "description": "The name of the index to search"
                    },
                    "query": {
                        "type": "string",
                        "description": "A JSON string representing an OpenSearch query"
                    },
                    "size": {
                        "type": "integer",
                        "description": "Maximum number of results to return (default: 100)",
                        "default": 100
                    }
                },
                "required": ["index", "query"]
            }
        }
    ])
}

/// `resources/list` entries.
pub fn resource_definitions() -> Value {
    json!([
        {
            "uri": URI_COLLECTIONS,
            "name": "list_mongodb_collections",
            "description": "List all MongoDB collections.",
            "mimeType": "text/plain"
        },
        {
            "uri": URI_INDICES,
            "name": "list_opensearch_indices",
            "description": "List all OpenSearch indices.",
            "mimeType": "text/plain"
        }
    ])
}

/// `resources/templates/list` entries.
pub fn resource_templates() -> Value {
    json!([
        {
            "uriTemplate": "mongodb://{collection}/schema",
            "name": "get_collection_schema",
            "description": "Get schema for a specific MongoDB collection.",
            "mimeType": "text/plain"
        },
        {
            "uriTemplate": "opensearch://{index}/mapping",
            "name": "get_index_mapping",
            "description": "Get the field mapping of a specific OpenSearch index.",
            "mimeType": "text/plain"
        }
    ])
}

/// A resource URI resolved to the entry point that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Collections,
    CollectionSchema(String),
    Indices,
    IndexMapping(String),
}

impl ResourceRef {
    pub fn parse(uri: &str) -> Option<Self> {
        match uri {
            URI_COLLECTIONS => return Some(ResourceRef::Collections),
            URI_INDICES => return Some(ResourceRef::Indices),
            _ => {}
        }

        if let Some(name) = template_param(uri, MONGODB_SCHEME, SCHEMA_SUFFIX) {
            return Some(ResourceRef::CollectionSchema(name));
        }
        template_param(uri, OPENSEARCH_SCHEME, MAPPING_SUFFIX).map(ResourceRef::IndexMapping)
    }
}

/// The single path segment between `scheme` and `suffix`, percent-decoded.
fn template_param(uri: &str, scheme: &str, suffix: &str) -> Option<String> {
    let raw = uri.strip_prefix(scheme)?.strip_suffix(suffix)?;
    if raw.contains('/') {
        return None;
    }
    let name = percent_decode_str(raw).decode_utf8().ok()?;
    if name.is_empty() {
        return None;
    }
    Some(name.into_owned())
}

/// Arguments of `query_mongodb`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryArgs {
    pub collection: String,
    #[serde(deserialize_with = "query_text")]
    pub query: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Arguments of `search_opensearch`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub index: String,
    #[serde(deserialize_with = "query_text")]
    pub query: String,
    #[serde(default)]
    pub size: Option<i64>,
}

/// Accept the query as a JSON string, or as an inline JSON value that is
/// re-encoded to text so both take the same decoding path.
fn query_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        other => other.to_string(),
    })
}
