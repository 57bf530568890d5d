//! Search-index handle built on the `opensearch` client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::auth::Credentials;
use opensearch::cert::CertificateValidation;
use opensearch::http::response::Response;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::http::Url;
use opensearch::indices::{IndicesGetMappingParts, IndicesGetParts};
use opensearch::{OpenSearch, SearchParts};
use serde_json::Value;

use super::error::BackendError;
use super::state::ConnectionSlot;
use super::{Lifecycle, Lookup, SearchIndex};
use crate::config::OpenSearchConfig;

const BACKEND: &str = "OpenSearch";
const ALL_INDICES: &str = "*";

/// Handle to one OpenSearch cluster.
///
/// TLS certificate verification follows `verify_certs`, which is off
/// unless configured.
pub struct OpenSearchHandle {
    config: OpenSearchConfig,
    slot: ConnectionSlot<OpenSearch>,
}

impl OpenSearchHandle {
    pub fn new(config: OpenSearchConfig) -> Self {
        Self {
            config,
            slot: ConnectionSlot::new(BACKEND),
        }
    }

    async fn ensure_connected(&self) -> Result<OpenSearch, BackendError> {
        self.slot.ensure(|| open(&self.config)).await
    }
}

fn build_client(config: &OpenSearchConfig) -> Result<OpenSearch, BackendError> {
    let url: Url = config
        .base_url()
        .parse()
        .map_err(|e| BackendError::connection(BACKEND, format!("Invalid URL: {}", e)))?;

    let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(url))
        .timeout(Duration::from_secs(config.timeout_seconds));

    if !config.verify_certs {
        builder = builder.cert_validation(CertificateValidation::None);
    }

    if let Some(creds) = config.credentials() {
        builder = builder.auth(Credentials::Basic(
            creds.username,
            creds.password.expose().to_string(),
        ));
    }

    let transport = builder.build().map_err(|e| {
        BackendError::connection(BACKEND, format!("Failed to build transport: {}", e))
    })?;

    Ok(OpenSearch::new(transport))
}

async fn open(config: &OpenSearchConfig) -> Result<OpenSearch, BackendError> {
    tracing::debug!(url = %config.base_url(), use_ssl = config.use_ssl, "Opening OpenSearch client");
    let client = build_client(config)?;

    // Building the transport does no I/O; ping so an unreachable cluster or
    // rejected credentials fail at connect time.
    let response = client
        .ping()
        .send()
        .await
        .map_err(|e| BackendError::connection(BACKEND, e))?;

    let status = response.status_code();
    if !status.is_success() {
        return Err(BackendError::connection(
            BACKEND,
            format!("Ping returned status {}", status),
        ));
    }

    Ok(client)
}

/// Turn a response into a lookup: 404 means the index is missing.
async fn read_lookup(
    response: Response,
    index: &str,
    operation: &'static str,
) -> Result<Lookup, BackendError> {
    if response.status_code().as_u16() == 404 {
        return Ok(Lookup::NotFound(index.to_string()));
    }
    read_json(response, operation).await.map(Lookup::Found)
}

async fn read_json(response: Response, operation: &'static str) -> Result<Value, BackendError> {
    let status = response.status_code();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(BackendError::Upstream {
            backend: BACKEND,
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| BackendError::query(BACKEND, operation, e))
}

#[async_trait]
impl Lifecycle for OpenSearchHandle {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn connect(&self) -> Result<(), BackendError> {
        self.ensure_connected().await.map(|_| ())
    }

    async fn disconnect(&self) {
        // Pooled connections close once the last client clone is dropped.
        drop(self.slot.take().await);
    }

    async fn is_connected(&self) -> bool {
        self.slot.is_connected().await
    }

    fn release_now(&self) {
        self.slot.release_now();
    }
}

#[async_trait]
impl SearchIndex for OpenSearchHandle {
    async fn list_indices(&self) -> Result<Vec<String>, BackendError> {
        let client = self.ensure_connected().await?;
        let response = client
            .indices()
            .get(IndicesGetParts::Index(&[ALL_INDICES]))
            .send()
            .await
            .map_err(|e| BackendError::query(BACKEND, "indices.get", e))?;

        match read_json(response, "indices.get").await? {
            Value::Object(indices) => Ok(indices.into_iter().map(|(name, _)| name).collect()),
            other => Err(BackendError::query(
                BACKEND,
                "indices.get",
                format!("expected an object of indices, got {}", other),
            )),
        }
    }

    async fn index_mapping(&self, index: &str) -> Result<Lookup, BackendError> {
        let client = self.ensure_connected().await?;
        let response = client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| BackendError::query(BACKEND, "indices.get_mapping", e))?;

        read_lookup(response, index, "indices.get_mapping").await
    }

    async fn search(&self, index: &str, body: Value, size: u64) -> Result<Lookup, BackendError> {
        let client = self.ensure_connected().await?;
        let response = client
            .search(SearchParts::Index(&[index]))
            .size(i64::try_from(size).unwrap_or(i64::MAX))
            .body(body)
            .send()
            .await
            .map_err(|e| BackendError::query(BACKEND, "search", e))?;

        read_lookup(response, index, "search").await
    }
}
