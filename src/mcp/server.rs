use std::io;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::catalog::{
    self, QueryArgs, ResourceRef, SearchArgs, TOOL_QUERY_MONGODB, TOOL_SEARCH_OPENSEARCH,
};
use super::jsonrpc::{parse_request, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::gateway::{Gateway, Reply};
use crate::shutdown::{ShutdownHandle, ShutdownPhase};

pub const SERVER_NAME: &str = "MongoDB-OpenSearch Explorer";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-06-18";

const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct InitializeParams {
    #[serde(default, rename = "protocolVersion")]
    protocol_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// MCP server over newline-delimited JSON-RPC.
pub struct McpServer {
    gateway: Gateway,
}

impl McpServer {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Handle one raw input line; `None` means nothing is sent back.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match parse_request(line) {
            Ok(request) => self.handle(request).await?,
            Err(response) => response,
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!(method = %request.method, id = ?request.id, "Dispatching request");

        if request.is_notification() {
            // Nothing to answer; `notifications/initialized` and friends land here.
            tracing::trace!(method = %request.method, "Notification received");
            return None;
        }

        let id = request.id.clone();
        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": catalog::tool_definitions() })),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": catalog::resource_definitions() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": catalog::resource_templates() }))
            }
            "resources/read" => self.read_resource(params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = decode_params(params)?;
        let protocol_version = params
            .protocol_version
            .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string());

        tracing::info!(%protocol_version, "Client initialized");
        Ok(json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = decode_params(params)?;

        let reply = match params.name.as_str() {
            TOOL_QUERY_MONGODB => {
                let args: QueryArgs = decode_params(params.arguments)?;
                self.gateway
                    .query_collection(&args.collection, &args.query, args.limit)
                    .await
            }
            TOOL_SEARCH_OPENSEARCH => {
                let args: SearchArgs = decode_params(params.arguments)?;
                self.gateway
                    .search_index(&args.index, &args.query, args.size)
                    .await
            }
            other => {
                return Err(JsonRpcError::invalid_params(format!("Unknown tool: {}", other)));
            }
        };

        Ok(tool_result(reply))
    }

    async fn read_resource(&self, params: Value) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = decode_params(params)?;
        let Some(resource) = ResourceRef::parse(&params.uri) else {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown resource: {}",
                params.uri
            )));
        };

        let reply = match resource {
            ResourceRef::Collections => self.gateway.list_collections().await,
            ResourceRef::CollectionSchema(collection) => {
                self.gateway.collection_schema(&collection).await
            }
            ResourceRef::Indices => self.gateway.list_indices().await,
            ResourceRef::IndexMapping(index) => self.gateway.index_mapping(&index).await,
        };

        Ok(json!({
            "contents": [{
                "uri": params.uri,
                "mimeType": "text/plain",
                "text": reply.text
            }]
        }))
    }

    /// Serve requests from `reader` until EOF or shutdown.
    ///
    /// Each request runs on its own task; responses go out through a single
    /// writer task in completion order. In-flight requests are awaited
    /// before returning.
    pub async fn serve<R, W>(self, reader: R, writer: W, shutdown: ShutdownHandle) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let server = Arc::new(self);
        let (outbound, outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);
        let writer_task = tokio::spawn(write_responses(writer, outbound_rx));

        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = JoinSet::new();
        let mut read_error = None;

        tracing::info!("MCP server ready");
        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    tracing::info!("Shutdown requested, no longer reading requests");
                    break;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let server = Arc::clone(&server);
                        let outbound = outbound.clone();
                        in_flight.spawn(async move {
                            if let Some(response) = server.handle_line(&line).await {
                                if outbound.send(response).await.is_err() {
                                    tracing::trace!("Response dropped (writer gone)");
                                }
                            }
                        });
                    }
                    Ok(None) => {
                        tracing::info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read request");
                        read_error = Some(e);
                        break;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join(joined);
                }
            }
        }

        shutdown.advance(ShutdownPhase::DrainingRequests);
        if !in_flight.is_empty() {
            tracing::info!(pending = in_flight.len(), "Waiting for in-flight requests");
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }

        drop(outbound);
        let written = match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        };

        match read_error {
            Some(e) => Err(e),
            None => written,
        }
    }
}

async fn write_responses<W>(mut writer: W, mut outbound: mpsc::Receiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = outbound.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Request task failed");
    }
}

fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    // Absent params behave like an empty object.
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn tool_result(reply: Reply) -> Value {
    json!({
        "content": [{ "type": "text", "text": reply.text }],
        "isError": reply.is_error
    })
}
