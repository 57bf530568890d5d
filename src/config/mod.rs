//! Configuration provider.
//!
//! Settings come from built-in defaults, an optional TOML file and the
//! process environment, in that order of precedence.

pub mod credentials;
pub mod loader;
pub mod types;

pub use credentials::{redact_uri, BasicCredentials, SecureString};
pub use loader::ConfigError;
pub use types::{Config, LimitsConfig, MongoConfig, OpenSearchConfig};
