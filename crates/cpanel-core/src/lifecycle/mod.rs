//! Lifecycle driver
//!
//! The [`LifecycleDriver`] plays the orchestrator for one resource address at
//! a time: it compares declared attributes with tracked state, decides which
//! of Create/Update/Replace applies, invokes the resource, and persists the
//! resulting identifier and attributes.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   desired    ┌──────────────────┐   create/read/    ┌────────────┐
//! │   caller     │────────────▶ │ LifecycleDriver  │──update/delete──▶ │  Resource  │
//! └──────────────┘              └──────────────────┘                   └────────────┘
//!                                   │         ▲                              │
//!                              put/remove   get                          CpanelApi
//!                                   ▼         │
//!                               ┌──────────────────┐
//!                               │    StateStore    │
//!                               └──────────────────┘
//! ```
//!
//! ## Apply
//!
//! 1. Refresh tracked state (an entity deleted out of band is forgotten)
//! 2. Plan against the refreshed attributes
//! 3. Execute: Create, Update in place, or Replace (delete, then create)
//! 4. Persist the new identifier and attributes

use crate::error::{Error, Result};
use crate::registry::ResourceRegistry;
use crate::schema::ResourceSchema;
use crate::traits::{Attributes, CpanelApi, Resource, ResourceState, StateStore, TrackedResource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Address of a declared resource: `<type>.<name>`
///
/// ```
/// use cpanel_core::lifecycle::ResourceAddress;
///
/// let address: ResourceAddress = "cpanel_zone_record.www".parse().unwrap();
/// assert_eq!(address.resource_type, "cpanel_zone_record");
/// assert_eq!(address.name, "www");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceAddress {
    /// Registered resource type name
    pub resource_type: String,
    /// Caller-chosen instance name
    pub name: String,
}

impl ResourceAddress {
    /// Create an address
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

impl FromStr for ResourceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
                Ok(Self::new(resource_type, name))
            }
            _ => Err(Error::invalid_input(format!(
                "malformed resource address '{s}', expected <type>.<name>"
            ))),
        }
    }
}

/// What applying declared attributes would do
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Plan {
    /// Nothing tracked; the entity will be created
    Create,
    /// Mutable fields differ; updated in place
    Update {
        /// Changed field names
        changed: Vec<String>,
    },
    /// A ForceNew field differs; deleted and created again
    Replace {
        /// ForceNew fields that differ
        force_new: Vec<String>,
    },
    /// Tracked attributes already match
    NoOp,
}

impl Plan {
    fn for_state(
        schema: &ResourceSchema,
        tracked: Option<&TrackedResource>,
        desired: &Attributes,
    ) -> Self {
        let Some(tracked) = tracked.filter(|t| !t.id.is_empty()) else {
            return Plan::Create;
        };

        let diff = schema.diff(&tracked.attributes, desired);
        if diff.is_empty() {
            Plan::NoOp
        } else if diff.requires_replacement() {
            Plan::Replace {
                force_new: diff.force_new.iter().map(|f| f.to_string()).collect(),
            }
        } else {
            Plan::Update {
                changed: diff.changed.iter().map(|f| f.to_string()).collect(),
            }
        }
    }
}

/// Result of an apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// A new entity was created
    Created {
        /// Identifier of the new entity
        id: String,
    },
    /// The entity was updated in place
    Updated {
        /// Identifier (unchanged)
        id: String,
        /// Fields that were changed
        changed: Vec<String>,
    },
    /// The entity was deleted and created again
    Replaced {
        /// Identifier of the deleted entity
        previous_id: String,
        /// Identifier of the new entity
        id: String,
    },
    /// Nothing to do
    Unchanged {
        /// Identifier of the tracked entity
        id: String,
    },
}

/// Drives resources through their lifecycle and keeps state in step
pub struct LifecycleDriver {
    /// cPanel API capability handed to every resource call
    api: Arc<dyn CpanelApi>,

    /// Resource kinds by type name
    registry: Arc<ResourceRegistry>,

    /// Tracked identifiers and attributes
    state: Box<dyn StateStore>,
}

impl LifecycleDriver {
    /// Create a driver
    pub fn new(
        api: Arc<dyn CpanelApi>,
        registry: Arc<ResourceRegistry>,
        state: Box<dyn StateStore>,
    ) -> Self {
        Self {
            api,
            registry,
            state,
        }
    }

    /// Decide what applying `desired` would do, without calling the backend
    ///
    /// Declared attributes are validated first, so an invalid declaration
    /// fails here rather than during apply.
    pub async fn plan(&self, address: &ResourceAddress, desired: &Attributes) -> Result<Plan> {
        let resource = self.registry.get(&address.resource_type)?;
        let normalized = resource.schema().normalize(desired)?;
        let tracked = self.state.get(&address.to_string()).await?;

        Ok(Plan::for_state(
            resource.schema(),
            tracked.as_ref(),
            &normalized,
        ))
    }

    /// Reconcile the backend with `desired`
    pub async fn apply(
        &self,
        address: &ResourceAddress,
        desired: &Attributes,
    ) -> Result<ApplyOutcome> {
        let resource = self.registry.get(&address.resource_type)?;
        let normalized = resource.schema().normalize(desired)?;
        let key = address.to_string();

        let tracked = match self.state.get(&key).await? {
            Some(tracked) => self.refresh_tracked(&key, resource.as_ref(), tracked).await?,
            None => None,
        };

        let plan = Plan::for_state(resource.schema(), tracked.as_ref(), &normalized);
        debug!("Plan for {}: {:?}", key, plan);

        match (plan, tracked) {
            (Plan::NoOp, Some(tracked)) => Ok(ApplyOutcome::Unchanged { id: tracked.id }),
            (Plan::Update { changed }, Some(tracked)) => {
                let current = tracked.state();
                let attributes = resource
                    .update(self.api.as_ref(), &current, &normalized)
                    .await?;
                self.track(address, ResourceState::new(current.id.clone(), attributes))
                    .await?;

                info!("Updated {} ({})", key, changed.join(", "));
                Ok(ApplyOutcome::Updated {
                    id: current.id,
                    changed,
                })
            }
            (Plan::Replace { force_new }, Some(tracked)) => {
                let mut current = tracked.state();
                let previous_id = current.id.clone();

                info!("Replacing {} ({} changed)", key, force_new.join(", "));
                resource.delete(self.api.as_ref(), &mut current).await?;
                self.forget(&key).await?;

                let created = resource.create(self.api.as_ref(), &normalized).await?;
                let id = created.id.clone();
                self.track(address, created).await?;

                Ok(ApplyOutcome::Replaced { previous_id, id })
            }
            _ => {
                let created = resource.create(self.api.as_ref(), &normalized).await?;
                let id = created.id.clone();
                self.track(address, created).await?;

                info!("Created {} as {}", key, id);
                Ok(ApplyOutcome::Created { id })
            }
        }
    }

    /// Re-read a tracked resource
    ///
    /// # Returns
    ///
    /// - `Ok(Some(TrackedResource))`: Still present; state updated
    /// - `Ok(None)`: Gone out of band; state removed
    /// - `Err(Error::NotFound)`: Nothing tracked at the address
    pub async fn refresh(&self, address: &ResourceAddress) -> Result<Option<TrackedResource>> {
        let resource = self.registry.get(&address.resource_type)?;
        let key = address.to_string();
        let tracked = self.tracked(&key).await?;

        self.refresh_tracked(&key, resource.as_ref(), tracked).await
    }

    /// Delete a tracked resource and stop tracking it
    ///
    /// State is only removed once the backend has confirmed the delete.
    pub async fn destroy(&self, address: &ResourceAddress) -> Result<()> {
        let resource = self.registry.get(&address.resource_type)?;
        let key = address.to_string();
        let tracked = self.tracked(&key).await?;

        let mut current = tracked.state();
        resource.delete(self.api.as_ref(), &mut current).await?;
        self.forget(&key).await?;

        info!("Destroyed {} ({})", key, tracked.id);
        Ok(())
    }

    /// Start tracking an existing entity by identifier
    pub async fn import(&self, address: &ResourceAddress, id: &str) -> Result<TrackedResource> {
        let resource = self.registry.get(&address.resource_type)?;
        let key = address.to_string();

        if id.trim().is_empty() {
            return Err(Error::invalid_input("Identifier cannot be empty"));
        }
        if self.state.get(&key).await?.is_some() {
            return Err(Error::invalid_input(format!("{key} is already tracked")));
        }

        let probe = ResourceState::new(id, Attributes::new());
        let Some(attributes) = resource.read(self.api.as_ref(), &probe).await? else {
            return Err(Error::not_found(format!(
                "{} {} does not exist",
                address.resource_type, id
            )));
        };

        let tracked = self.track(address, ResourceState::new(id, attributes)).await?;
        info!("Imported {} as {}", id, key);
        Ok(tracked)
    }

    /// All tracked resources by address
    pub async fn list(&self) -> Result<BTreeMap<String, TrackedResource>> {
        let mut entries = BTreeMap::new();
        for key in self.state.list().await? {
            if let Some(tracked) = self.state.get(&key).await? {
                entries.insert(key, tracked);
            }
        }
        Ok(entries)
    }

    async fn tracked(&self, key: &str) -> Result<TrackedResource> {
        self.state
            .get(key)
            .await?
            .ok_or_else(|| Error::not_found(format!("Nothing tracked at {key}")))
    }

    async fn refresh_tracked(
        &self,
        key: &str,
        resource: &dyn Resource,
        tracked: TrackedResource,
    ) -> Result<Option<TrackedResource>> {
        match resource.read(self.api.as_ref(), &tracked.state()).await? {
            Some(attributes) => {
                let refreshed = TrackedResource::new(
                    tracked.resource_type,
                    ResourceState::new(tracked.id, attributes),
                );
                self.state.put(key, &refreshed).await?;
                self.state.flush().await?;
                Ok(Some(refreshed))
            }
            None => {
                warn!("{} ({}) no longer exists; forgetting it", key, tracked.id);
                self.forget(key).await?;
                Ok(None)
            }
        }
    }

    async fn track(&self, address: &ResourceAddress, state: ResourceState) -> Result<TrackedResource> {
        let tracked = TrackedResource::new(address.resource_type.clone(), state);
        self.state.put(&address.to_string(), &tracked).await?;
        self.state.flush().await?;
        Ok(tracked)
    }

    async fn forget(&self, key: &str) -> Result<()> {
        self.state.remove(key).await?;
        self.state.flush().await
    }
}
