use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mongodb: MongoConfig,
    #[serde(default)]
    pub opensearch: OpenSearchConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Connection settings for the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string (e.g., "mongodb://localhost:27017").
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    /// Database selected after connecting.
    #[serde(default = "default_mongo_database")]
    pub database: String,
    /// Server selection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Application name reported to the server.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Connection settings for the search cluster.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenSearchConfig {
    #[serde(default = "default_opensearch_host")]
    pub host: String,
    #[serde(default = "default_opensearch_port")]
    pub port: u16,
    #[serde(default = "default_opensearch_username")]
    pub username: String,
    #[serde(default = "default_opensearch_password")]
    pub password: String,
    /// Talk HTTPS instead of HTTP.
    #[serde(default)]
    pub use_ssl: bool,
    /// Verify the server certificate when `use_ssl` is on (default: false).
    #[serde(default)]
    pub verify_certs: bool,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,
}

/// Result-size limits applied by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Used when the caller gives no limit (default: 100).
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    /// Hard ceiling; larger requests are clamped (default: 10000).
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongo_database() -> String {
    "test".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_app_name() -> String {
    "mongosearch-mcp".to_string()
}

fn default_opensearch_host() -> String {
    "localhost".to_string()
}

fn default_opensearch_port() -> u16 {
    9200
}

fn default_opensearch_username() -> String {
    "admin".to_string()
}

fn default_opensearch_password() -> String {
    "admin".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_limit() -> u64 {
    100
}

fn default_max_limit() -> u64 {
    10_000
}

impl OpenSearchConfig {
    /// Base URL derived from host, port and the TLS toggle.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

impl std::fmt::Debug for OpenSearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"••••••••")
            .field("use_ssl", &self.use_ssl)
            .field("verify_certs", &self.verify_certs)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            database: default_mongo_database(),
            connect_timeout_seconds: default_connect_timeout(),
            app_name: default_app_name(),
        }
    }
}

impl Default for OpenSearchConfig {
    fn default() -> Self {
        Self {
            host: default_opensearch_host(),
            port: default_opensearch_port(),
            username: default_opensearch_username(),
            password: default_opensearch_password(),
            use_ssl: false,
            verify_certs: false,
            timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}
