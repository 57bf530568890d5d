//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod fakes;
pub mod mock_opensearch;

use std::sync::Arc;

use mongosearch_mcp::backend::{DocumentStore, SearchIndex};
use mongosearch_mcp::context::AppContext;
use mongosearch_mcp::gateway::{Gateway, ResultLimits};

pub use fakes::{FakeDocumentStore, FakeSearchIndex};
pub use mock_opensearch::{CapturedRequest, MockOpenSearch, MockResponse};

/// Build a gateway over already-constructed fakes.
///
/// The fakes connect lazily on first use, so no scope is required.
pub fn gateway_over(
    documents: Arc<FakeDocumentStore>,
    search: Arc<FakeSearchIndex>,
    limits: ResultLimits,
) -> Gateway {
    let documents: Arc<dyn DocumentStore> = documents;
    let search: Arc<dyn SearchIndex> = search;
    Gateway::new(AppContext { documents, search }, limits)
}
