// # Memory State Store
//
// In-memory implementation of StateStore.
//
// ## Purpose
//
// Tracks identifiers for the lifetime of the process only. Used by tests
// and by hosts that keep durable state elsewhere.
//
// ## Crash Behavior
//
// - All tracked identifiers are lost on restart/crash
// - Entities created earlier are no longer addressable; re-adopt them with
//   `LifecycleDriver::import`

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateStore, TrackedResource};

/// In-memory state store implementation
///
/// # Example
///
/// ```rust,no_run
/// use cpanel_core::state::MemoryStateStore;
/// use cpanel_core::traits::{ResourceState, StateStore, TrackedResource};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     let tracked = TrackedResource::new(
///         "cpanel_domain",
///         ResourceState::new("example.com", Default::default()),
///     );
///
///     store.put("cpanel_domain.example", &tracked).await?;
///     assert_eq!(store.get("cpanel_domain.example").await?, Some(tracked));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<BTreeMap<String, TrackedResource>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of tracked addresses
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, address: &str) -> Result<Option<TrackedResource>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(address).cloned())
    }

    async fn put(&self, address: &str, resource: &TrackedResource) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .insert(address.to_string(), resource.clone());
        Ok(())
    }

    async fn remove(&self, address: &str) -> Result<(), Error> {
        self.inner.write().await.remove(address);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
