//! Resource type registry
//!
//! Maps resource type names (`cpanel_domain`, ...) to their implementations
//! so that callers dispatch on a name from configuration instead of
//! hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust
//! use cpanel_core::registry::ResourceRegistry;
//!
//! let registry = ResourceRegistry::with_builtin();
//! assert!(registry.has_type("cpanel_zone_record"));
//!
//! let resource = registry.get("cpanel_subdomain").unwrap();
//! assert_eq!(resource.type_name(), "cpanel_subdomain");
//! ```

use crate::error::{Error, Result};
use crate::resources::{DomainResource, SubdomainResource, ZoneRecordResource};
use crate::schema::ResourceSchema;
use crate::traits::Resource;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of managed resource kinds
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: RwLock<HashMap<String, Arc<dyn Resource>>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the three built-in kinds
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(DomainResource));
        registry.register(Arc::new(SubdomainResource));
        registry.register(Arc::new(ZoneRecordResource));
        registry
    }

    /// Register a resource kind under its schema type name
    ///
    /// A kind registered under an existing name replaces the previous one.
    pub fn register(&self, resource: Arc<dyn Resource>) {
        let name = resource.type_name().to_string();
        let mut resources = self
            .resources
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        resources.insert(name, resource);
    }

    /// Look up a resource kind
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<dyn Resource>)`: The registered kind
    /// - `Err(Error::NotFound)`: No kind with that name
    pub fn get(&self, type_name: &str) -> Result<Arc<dyn Resource>> {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Unknown resource type: {type_name}")))
    }

    /// Check if a resource type is registered
    pub fn has_type(&self, type_name: &str) -> bool {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        resources.contains_key(type_name)
    }

    /// List registered type names, sorted
    pub fn list_types(&self) -> Vec<String> {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = resources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Schemas of all registered kinds, sorted by type name
    pub fn schemas(&self) -> Vec<&'static ResourceSchema> {
        let resources = self
            .resources
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut schemas: Vec<&'static ResourceSchema> =
            resources.values().map(|r| r.schema()).collect();
        schemas.sort_by_key(|s| s.type_name);
        schemas
    }
}
