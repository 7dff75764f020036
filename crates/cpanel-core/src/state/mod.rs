// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use crate::traits::StateStore;
use serde::{Deserialize, Serialize};

/// State store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

impl StateStoreConfig {
    /// Open the configured store
    pub async fn open(&self) -> Result<Box<dyn StateStore>, crate::Error> {
        match self {
            StateStoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("State file path cannot be empty"));
                }
                Ok(Box::new(FileStateStore::new(path).await?))
            }
            StateStoreConfig::Memory => Ok(Box::new(MemoryStateStore::new())),
        }
    }
}
