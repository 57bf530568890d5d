//! MCP surface: JSON-RPC framing, the tool/resource catalog and the stdio
//! server that routes calls into the gateway.

pub mod catalog;
pub mod jsonrpc;
pub mod server;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use server::{McpServer, DEFAULT_PROTOCOL_VERSION, SERVER_NAME};
