//! Core traits for the cPanel connector
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`CpanelApi`]: Submit one call against either cPanel dialect
//! - [`Resource`]: Create/Read/Update/Delete for one managed resource kind
//! - [`StateStore`]: Persistent tracking of identifiers and attributes

pub mod cpanel_api;
pub mod resource;
pub mod state_store;

pub use cpanel_api::CpanelApi;
pub use resource::{Attributes, Resource, ResourceState};
pub use state_store::{StateStore, TrackedResource};
