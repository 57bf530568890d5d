//! Connection state shared by the backend handles.
//!
//! A handle is either unconnected (no client) or connected (client present).
//! Every read operation goes through [`ConnectionSlot::ensure`], which is the
//! single place where the lazy connect happens.

use std::future::Future;

use tokio::sync::Mutex;

use super::error::BackendError;

/// Holder of an optional live client.
///
/// The client is `Some` exactly when the handle is connected. The lock is
/// held across the connect call so concurrent first uses open one client.
pub struct ConnectionSlot<C> {
    backend: &'static str,
    client: Mutex<Option<C>>,
}

impl<C: Clone + Send> ConnectionSlot<C> {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            client: Mutex::new(None),
        }
    }

    /// Return the live client, opening it with `open` if unconnected.
    ///
    /// On failure the slot stays unconnected and the error is returned as is.
    pub async fn ensure<F, Fut>(&self, open: F) -> Result<C, BackendError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, BackendError>>,
    {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = open().await?;
        tracing::info!(backend = self.backend, "Backend connected");
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Move the slot to unconnected, handing back the client if there was one.
    pub async fn take(&self) -> Option<C> {
        let client = self.client.lock().await.take();
        if client.is_some() {
            tracing::info!(backend = self.backend, "Backend disconnected");
        }
        client
    }

    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Drop the client without awaiting.
    ///
    /// Used when the owning scope is torn down without a chance to run the
    /// async disconnect. Returns false if the slot was busy or already empty.
    pub fn release_now(&self) -> bool {
        match self.client.try_lock() {
            Ok(mut slot) => {
                let released = slot.take().is_some();
                if released {
                    tracing::warn!(backend = self.backend, "Backend client dropped without disconnect");
                }
                released
            }
            Err(_) => false,
        }
    }
}
