//! Core platform layer for BlockForge.
//! Resolves which host implementation serves each capability, loads a
//! version-matched host adapter and keeps the host vocabulary in
//! namespaced registries.

pub mod adapter;
pub mod bootstrap;
pub mod config;
pub mod event;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod registry;

pub use adapter::host::{HostInfo, HostVariant, HostVersion, HostVersionError};
pub use adapter::loader::{
    AdapterCandidate, AdapterLoadError, AdapterLoader, CandidateSource, FactoryError, VersionRange,
};
pub use adapter::{HostAdapter, LoadedAdapter};
pub use bootstrap::{
    host_platform, AdapterStatus, Bootstrap, BootstrapError, HostData, MaterialEntry, Phase,
};
pub use config::{AdapterConfig, ConfigError, CoreConfig, SearchConfig};
pub use event::{DeliveryReport, Event, EventBus, EventKind, HandlerResult, SubscriptionId};
pub use lifecycle::Lifecycled;
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
};
pub use platform::capability::{parse_capability, Capability, CapabilityError, SideEffect};
pub use platform::manager::PlatformManager;
pub use platform::{Platform, PlatformDescriptor, PlatformError};
pub use registry::keyed::{Keyed, NamespacedKey};
pub use registry::namespaced::{NamespacedRegistry, RegistryError};
pub use registry::search::{
    search_items, search_registry, search_registry_by_id, ItemFilter, RegistryQuery, SearchError,
    SearchPage,
};
pub use registry::types::{
    BiomeType, BlockCategory, BlockType, EntityType, FluidType, ItemCategory, ItemType,
    TypeRegistries,
};

/// Minimal health-check API for embedder smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
