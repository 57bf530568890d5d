pub mod backend;
pub mod config;
pub mod context;
pub mod gateway;
pub mod logging;
pub mod mcp;
pub mod runtime;
pub mod shutdown;
