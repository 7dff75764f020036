// # State Store Trait
//
// Defines the interface for persistent resource tracking.
//
// ## Purpose
//
// cPanel offers no place to remember which entities a declaration owns, so
// the caller keeps, per resource address:
// - The opaque identifier returned by Create (e.g. `example.com:42`)
// - The last observed attributes
// - When the entry was last written
//
// Without the identifier, Read/Update/Delete cannot address the entity
// after a restart.
//
// ## Usage
//
// ```rust,ignore
// use cpanel_core::{MemoryStateStore, StateStore};
//
// let store = MemoryStateStore::new();
// if let Some(tracked) = store.get("cpanel_zone_record.www").await? {
//     println!("tracking {}", tracked.id);
// }
// ```

use crate::traits::resource::{Attributes, ResourceState};
use async_trait::async_trait;

/// Tracked state for one resource address
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackedResource {
    /// Resource type name (e.g., "cpanel_subdomain")
    pub resource_type: String,
    /// Opaque identifier
    pub id: String,
    /// Last observed attributes
    pub attributes: Attributes,
    /// Timestamp of the last write
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl TrackedResource {
    /// Create a tracked entry stamped with the current time
    pub fn new(resource_type: impl Into<String>, state: ResourceState) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: state.id,
            attributes: state.attributes,
            last_updated: chrono::Utc::now(),
        }
    }

    /// The identifier and attributes as a [`ResourceState`]
    pub fn state(&self) -> ResourceState {
        ResourceState::new(self.id.clone(), self.attributes.clone())
    }
}

/// Trait for state store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage (files, databases, etc.)
/// - ✅ Implement locking/concurrency control for thread safety
///
/// ## Forbidden Capabilities
/// - ❌ Call the cPanel API (owned by the resources)
/// - ❌ Decide lifecycle transitions (owned by `LifecycleDriver`)
/// - ❌ Persist the API token
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the tracked entry for an address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(TrackedResource))`: The entry
    /// - `Ok(None)`: Nothing tracked at this address
    /// - `Err(Error)`: Storage error
    async fn get(&self, address: &str) -> Result<Option<TrackedResource>, crate::Error>;

    /// Create or replace the entry for an address
    async fn put(&self, address: &str, resource: &TrackedResource) -> Result<(), crate::Error>;

    /// Stop tracking an address (no error if absent)
    async fn remove(&self, address: &str) -> Result<(), crate::Error>;

    /// List all tracked addresses
    async fn list(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
