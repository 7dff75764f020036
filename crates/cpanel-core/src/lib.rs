// # cpanel-core
//
// Core library for managing cPanel hosting resources declaratively.
//
// ## Architecture Overview
//
// This library provides everything except the network transport:
// - **ApiCall**: One UAPI or API2 call, its URL shape and envelope interpretation
// - **CpanelApi**: Trait for submitting calls (implemented by `cpanel-client`)
// - **Resource**: Trait for Create/Read/Update/Delete of one resource kind
// - **StateStore**: Trait for remembering identifiers between runs
// - **LifecycleDriver**: Plans and applies declared attributes per address
// - **ResourceRegistry**: Resource kinds by type name
//
// ## Design Principles
//
// 1. **No I/O in reconcilers**: Resources only talk to `dyn CpanelApi`
// 2. **Caller-driven**: Nothing runs unless a lifecycle operation is invoked
// 3. **Explicit identity**: Every identifier is derived or confirmed, never guessed
// 4. **Library-First**: The binary is a thin shell over `LifecycleDriver`

pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use api::{ApiCall, Dialect};
pub use config::ConnectionConfig;
pub use error::{Error, Result};
pub use lifecycle::{ApplyOutcome, LifecycleDriver, Plan, ResourceAddress};
pub use registry::ResourceRegistry;
pub use schema::{FieldSchema, ResourceSchema};
pub use state::{FileStateStore, MemoryStateStore, StateStoreConfig};
pub use traits::{Attributes, CpanelApi, Resource, ResourceState, StateStore, TrackedResource};
