//! Scoped connection management and the application context.
//!
//! [`scoped`] connects a handle, runs a body with it and disconnects on the
//! way out. [`with_app_context`] nests two such scopes so that a failure to
//! open the second backend still closes the first.

use std::future::Future;
use std::sync::Arc;

use scopeguard::ScopeGuard;

use crate::backend::{BackendError, DocumentStore, Lifecycle, SearchIndex};

/// One live handle per backend, shared by every entry point.
#[derive(Clone)]
pub struct AppContext {
    pub documents: Arc<dyn DocumentStore>,
    pub search: Arc<dyn SearchIndex>,
}

/// Connect `handle`, run `body`, then disconnect exactly once.
///
/// Connect failures are returned before `body` runs. If the returned future
/// is dropped mid-flight or `body` panics, the handle's client is dropped
/// synchronously instead of going through the async disconnect.
pub async fn scoped<H, F, Fut, T>(handle: Arc<H>, body: F) -> Result<T, BackendError>
where
    H: Lifecycle + ?Sized,
    F: FnOnce(Arc<H>) -> Fut,
    Fut: Future<Output = T>,
{
    handle.connect().await?;

    let guard = scopeguard::guard(Arc::clone(&handle), |handle| {
        tracing::warn!(backend = handle.name(), "Connection scope aborted");
        handle.release_now();
    });

    let output = body(Arc::clone(&handle)).await;

    let handle = ScopeGuard::into_inner(guard);
    handle.disconnect().await;
    Ok(output)
}

/// Open both backends, run `body` with the resulting context, close both.
///
/// The document store is opened first and closed last.
pub async fn with_app_context<F, Fut, T>(
    documents: Arc<dyn DocumentStore>,
    search: Arc<dyn SearchIndex>,
    body: F,
) -> Result<T, BackendError>
where
    F: FnOnce(AppContext) -> Fut,
    Fut: Future<Output = T>,
{
    scoped(documents, |documents| async move {
        scoped(search, |search| body(AppContext { documents, search })).await
    })
    .await
    .and_then(|inner| inner)
}
