// # Resource Trait
//
// Defines the four lifecycle operations every managed cPanel resource kind
// implements. The caller (orchestrator) owns sequencing:
//
// ```text
// Absent ──create──▶ Present ──update*──▶ Present ──delete──▶ Absent
//                       │
//                       └──read (gone out of band)──▶ Absent
// ```
//
// ## Implementations
//
// - `cpanel_domain`: addon/parked domains
// - `cpanel_subdomain`: subdomains
// - `cpanel_zone_record`: DNS zone records

use crate::schema::ResourceSchema;
use crate::traits::CpanelApi;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute set of a resource, keyed by schema field name
pub type Attributes = Map<String, Value>;

/// Identifier plus observed attributes of a present resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Opaque identifier derived by the resource; empty once deleted
    pub id: String,
    /// Last observed attributes
    pub attributes: Attributes,
}

impl ResourceState {
    /// Create a new resource state
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Whether the identifier still refers to a backend entity
    pub fn is_tracked(&self) -> bool {
        !self.id.is_empty()
    }

    /// Forget the identifier
    pub fn clear(&mut self) {
        self.id.clear();
    }
}

/// Trait for managed resource kinds
///
/// Implementations are stateless; every call receives the API capability and
/// the caller-held state explicitly.
///
/// ## Contract
///
/// - `create` is not idempotent: calling it twice creates two entities
/// - `read` never mutates the backend and reports absence as `Ok(None)`
/// - `update` only sends mutable fields; nothing to change means no calls
/// - `delete` clears the identifier only after the backend confirms
#[async_trait]
pub trait Resource: Send + Sync {
    /// Field schema consumed by the orchestrator for diffing
    fn schema(&self) -> &'static ResourceSchema;

    /// Resource type name (e.g., "cpanel_zone_record")
    fn type_name(&self) -> &'static str {
        self.schema().type_name
    }

    /// Create the entity and derive its identifier
    ///
    /// # Parameters
    ///
    /// - `api`: cPanel API capability
    /// - `desired`: declared attributes (defaults are applied here)
    async fn create(
        &self,
        api: &dyn CpanelApi,
        desired: &Attributes,
    ) -> Result<ResourceState, crate::Error>;

    /// Re-fetch the entity
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Attributes))`: The entity exists; observed attributes
    /// - `Ok(None)`: The entity is gone (or the identifier is empty)
    /// - `Err(Error)`: The backend could not answer
    async fn read(
        &self,
        api: &dyn CpanelApi,
        current: &ResourceState,
    ) -> Result<Option<Attributes>, crate::Error>;

    /// Push changed mutable attributes
    async fn update(
        &self,
        api: &dyn CpanelApi,
        current: &ResourceState,
        desired: &Attributes,
    ) -> Result<Attributes, crate::Error>;

    /// Remove the entity, clearing `current.id` on success
    async fn delete(
        &self,
        api: &dyn CpanelApi,
        current: &mut ResourceState,
    ) -> Result<(), crate::Error>;
}
