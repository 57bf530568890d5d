use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::config::types::Config;

pub const ENV_MONGODB_URI: &str = "MONGODB_URI";
pub const ENV_MONGODB_DB_NAME: &str = "MONGODB_DB_NAME";
pub const ENV_OPENSEARCH_HOST: &str = "OPENSEARCH_HOST";
pub const ENV_OPENSEARCH_PORT: &str = "OPENSEARCH_PORT";
pub const ENV_OPENSEARCH_USERNAME: &str = "OPENSEARCH_USERNAME";
pub const ENV_OPENSEARCH_PASSWORD: &str = "OPENSEARCH_PASSWORD";
pub const ENV_OPENSEARCH_USE_SSL: &str = "OPENSEARCH_USE_SSL";
pub const ENV_DEFAULT_LIMIT: &str = "MONGOSEARCH_DEFAULT_LIMIT";
pub const ENV_MAX_LIMIT: &str = "MONGOSEARCH_MAX_LIMIT";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the default configuration file.
    ///
    /// Uses `~/.config/mongosearch-mcp/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("mongosearch-mcp").join("config.toml")
    }

    /// Loads configuration from file and process environment.
    ///
    /// - `explicit` set: the file must exist.
    /// - `explicit` unset: the default path is used when present, otherwise
    ///   built-in defaults.
    /// - Environment variables override whatever the file provided.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file without validating it.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Applies recognised environment variables on top of the current values.
    ///
    /// Unknown variables are ignored. Takes the variables as an iterator so
    /// callers can pass a fixed set instead of the process environment.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value: String = value.into();
            match key.as_ref() {
                ENV_MONGODB_URI => self.mongodb.uri = value,
                ENV_MONGODB_DB_NAME => self.mongodb.database = value,
                ENV_OPENSEARCH_HOST => self.opensearch.host = value,
                ENV_OPENSEARCH_PORT => {
                    self.opensearch.port = parse_env(ENV_OPENSEARCH_PORT, &value)?
                }
                ENV_OPENSEARCH_USERNAME => self.opensearch.username = value,
                ENV_OPENSEARCH_PASSWORD => self.opensearch.password = value,
                ENV_OPENSEARCH_USE_SSL => {
                    self.opensearch.use_ssl = parse_bool(ENV_OPENSEARCH_USE_SSL, &value)?
                }
                ENV_DEFAULT_LIMIT => {
                    self.limits.default_limit = parse_env(ENV_DEFAULT_LIMIT, &value)?
                }
                ENV_MAX_LIMIT => self.limits.max_limit = parse_env(ENV_MAX_LIMIT, &value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The MongoDB URI uses a `mongodb://` or `mongodb+srv://` scheme
    /// - Database and host are not empty, port is not zero
    /// - `1 <= default_limit <= max_limit`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uri = self.mongodb.uri.trim();
        if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
            return Err(ConfigError::ValidationError {
                message: "MongoDB URI must start with 'mongodb://' or 'mongodb+srv://'"
                    .to_string(),
            });
        }

        if self.mongodb.database.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "MongoDB database name must not be empty".to_string(),
            });
        }

        if self.opensearch.host.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "OpenSearch host must not be empty".to_string(),
            });
        }

        if self.opensearch.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "OpenSearch port must not be 0".to_string(),
            });
        }

        if self.limits.default_limit == 0 {
            return Err(ConfigError::ValidationError {
                message: "default_limit must be at least 1".to_string(),
            });
        }

        if self.limits.max_limit < self.limits.default_limit {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "max_limit ({}) must not be smaller than default_limit ({})",
                    self.limits.max_limit, self.limits.default_limit
                ),
            });
        }

        Ok(())
    }
}

fn parse_env<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            reason: "expected a boolean (true/false)".to_string(),
        }),
    }
}
