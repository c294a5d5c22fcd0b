//! Version-specific host adapters.
//!
//! # Responsibility
//! - Define the low-level adapter surface the loader instantiates.
//! - Describe the host so candidates can be matched by version.
//!
//! # Invariants
//! - At most one adapter is active at a time, held in a `Lifecycled` slot.
//! - A missing adapter is a normal, checked state for every consumer.

pub mod host;
pub mod loader;

use crate::adapter::loader::VersionRange;
use crate::registry::namespaced::RegistryError;
use crate::registry::types::TypeRegistries;
use std::fmt::{Debug, Formatter};

/// Host-version-specific bridge to the host's native object model.
pub trait HostAdapter: Send + Sync {
    /// Human-readable identity for logs.
    fn name(&self) -> &str;

    /// Native data version the adapter was built against.
    fn data_version(&self) -> u32;

    /// Populates registries only reachable through the native layer.
    fn initialize_registries(&self, registries: &mut TypeRegistries) -> Result<(), RegistryError> {
        let _ = registries;
        Ok(())
    }
}

/// The active adapter plus the candidate metadata it was chosen from.
pub struct LoadedAdapter {
    pub candidate: String,
    pub range: VersionRange,
    pub adapter: Box<dyn HostAdapter>,
}

impl LoadedAdapter {
    pub fn name(&self) -> &str {
        self.adapter.name()
    }
}

impl Debug for LoadedAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedAdapter")
            .field("candidate", &self.candidate)
            .field("range", &self.range)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}
