//! Startup and shutdown sequencing for the embedding host.
//!
//! # Responsibility
//! - Register the host platform, load a version-matched adapter and populate
//!   the type registries from host-reported data.
//! - Publish registries and announce readiness once world data exists.
//! - Tear everything down in reverse order on disable.
//!
//! # Invariants
//! - Startup order: adapter load, registry population, `PlatformReady`.
//! - Shutdown order: `PlatformUnready`, unregistration, invalidation.
//! - Adapter load failure degrades the session; it never fails startup.
//! - Registries become readable only after the world phase published them.

use crate::adapter::host::{HostInfo, HostVariant, HostVersion};
use crate::adapter::loader::AdapterLoader;
use crate::adapter::LoadedAdapter;
use crate::config::CoreConfig;
use crate::event::{Event, EventBus};
use crate::lifecycle::Lifecycled;
use crate::platform::capability::{Capability, SideEffect};
use crate::platform::manager::PlatformManager;
use crate::platform::{Platform, PlatformDescriptor, PlatformError};
use crate::registry::namespaced::NamespacedRegistry;
use crate::registry::types::{
    BiomeType, BlockCategory, BlockType, EntityType, ItemCategory, ItemType, TypeRegistries,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Placeholder biome some hosts expose; it has no world data behind it.
const PLACEHOLDER_BIOME: &str = "minecraft:custom";

/// One host material, which may be a block, an item, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialEntry {
    pub key: String,
    pub is_block: bool,
    pub is_item: bool,
}

impl MaterialEntry {
    pub fn new(key: impl Into<String>, is_block: bool, is_item: bool) -> Self {
        Self {
            key: key.into(),
            is_block,
            is_item,
        }
    }
}

/// Data the embedding host reports about itself and its vocabulary.
pub trait HostData: Send + Sync {
    fn info(&self) -> HostInfo;
    fn biomes(&self) -> Vec<String>;
    fn materials(&self) -> Vec<MaterialEntry>;
    fn entity_types(&self) -> Vec<String>;
    /// Only meaningful once the first world has been initialized.
    fn block_tags(&self) -> Vec<String>;
    /// Only meaningful once the first world has been initialized.
    fn item_tags(&self) -> Vec<String>;
    /// Whether worlds already exist, which means the host was reloaded.
    fn worlds_loaded(&self) -> bool;
}

/// Builds the platform describing the embedding host itself.
///
/// The host claims every capability with the configured priority.
pub fn host_platform(
    name: impl Into<String>,
    version: impl Into<String>,
    config: &CoreConfig,
) -> PlatformDescriptor {
    PlatformDescriptor::new(name, config.host_platform_priority, Capability::ALL)
        .with_version(version)
        .with_side_effects([
            SideEffect::Lighting,
            SideEffect::Neighbors,
            SideEffect::Update,
            SideEffect::Validation,
            SideEffect::EntityAi,
            SideEffect::Events,
            SideEffect::History,
            SideEffect::Heightmaps,
        ])
}

/// Lifecycle phase of one bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Loaded,
    Enabled,
    Ready,
    Disabled,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Loaded => "loaded",
            Self::Enabled => "enabled",
            Self::Ready => "ready",
            Self::Disabled => "disabled",
        }
    }
}

/// Outcome of the adapter load attempted by `on_enable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterStatus {
    NotAttempted,
    Loaded(String),
    /// No adapter, and world editing is left without a native backend.
    Unavailable,
    /// No adapter, but the named platform serves world editing.
    HandledBy(String),
}

impl Display for AdapterStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAttempted => f.write_str("not_attempted"),
            Self::Loaded(name) => write!(f, "loaded({name})"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::HandledBy(platform) => write!(f, "handled_by({platform})"),
        }
    }
}

/// Startup/shutdown errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    UnsupportedHostVersion(HostVersion),
    InvalidPhase { expected: Phase, actual: Phase },
    Platform(PlatformError),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedHostVersion(version) => write!(
                f,
                "host version {version} is not supported; use an older release of this extension"
            ),
            Self::InvalidPhase { expected, actual } => write!(
                f,
                "bootstrap step requires phase `{}`, current phase is `{}`",
                expected.as_str(),
                actual.as_str()
            ),
            Self::Platform(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Platform(err) => Some(err),
            Self::UnsupportedHostVersion(_) | Self::InvalidPhase { .. } => None,
        }
    }
}

impl From<PlatformError> for BootstrapError {
    fn from(value: PlatformError) -> Self {
        Self::Platform(value)
    }
}

/// Drives one embedding host through its startup and shutdown hooks.
pub struct Bootstrap {
    config: CoreConfig,
    host: Arc<dyn HostData>,
    platform: Arc<dyn Platform>,
    platforms: Arc<PlatformManager>,
    loader: AdapterLoader,
    adapter: Arc<Lifecycled<LoadedAdapter>>,
    registries: Arc<Lifecycled<TypeRegistries>>,
    pending: Option<TypeRegistries>,
    adapter_status: AdapterStatus,
    phase: Phase,
}

impl Bootstrap {
    pub fn new(
        config: CoreConfig,
        host: Arc<dyn HostData>,
        platform: Arc<dyn Platform>,
        platforms: Arc<PlatformManager>,
        loader: AdapterLoader,
    ) -> Self {
        Self {
            config,
            host,
            platform,
            platforms,
            loader,
            adapter: Arc::new(Lifecycled::invalid()),
            registries: Arc::new(Lifecycled::invalid()),
            pending: None,
            adapter_status: AdapterStatus::NotAttempted,
            phase: Phase::Created,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn platforms(&self) -> &Arc<PlatformManager> {
        &self.platforms
    }

    pub fn events(&self) -> &Arc<EventBus> {
        self.platforms.events()
    }

    /// Slot holding the active adapter, invalid when none could be loaded.
    pub fn adapter(&self) -> &Arc<Lifecycled<LoadedAdapter>> {
        &self.adapter
    }

    pub fn adapter_status(&self) -> &AdapterStatus {
        &self.adapter_status
    }

    /// Slot holding the published registries, valid once ready.
    pub fn registries(&self) -> &Arc<Lifecycled<TypeRegistries>> {
        &self.registries
    }

    /// Registers the host platform.
    ///
    /// # Errors
    /// - `UnsupportedHostVersion` for hosts older than the minimum release.
    /// - `Platform` when the host platform name is already registered.
    pub fn on_load(&mut self) -> Result<(), BootstrapError> {
        self.require_phase(Phase::Created)?;
        let info = self.host.info();
        if !info.is_supported() {
            warn!(
                "event=host_unsupported module=bootstrap status=error host={} variant={}",
                info.version, info.variant
            );
            return Err(BootstrapError::UnsupportedHostVersion(info.version));
        }

        self.platforms.register(Arc::clone(&self.platform))?;
        self.phase = Phase::Loaded;
        info!(
            "event=bootstrap_loaded module=bootstrap status=ok platform={} host={} variant={}",
            self.platform.name(),
            info.version,
            info.variant
        );
        Ok(())
    }

    /// Runs the pre-world phase; on a reload also the world phase.
    pub fn on_enable(&mut self) -> Result<(), BootstrapError> {
        self.require_phase(Phase::Loaded)?;
        self.events().post(&Event::PlatformsChanged);

        self.adapter_status = self.load_adapter();
        self.pending = Some(self.initialize_registries());
        self.phase = Phase::Enabled;

        if self.host.worlds_loaded() {
            warn!(
                "event=host_reload_detected module=bootstrap status=error message=\"reloading may cause issues with dependent extensions\""
            );
            self.on_world_init()?;
        }
        Ok(())
    }

    /// Runs the world phase: tags, registry publication, readiness.
    ///
    /// Calling it again once ready is a no-op.
    pub fn on_world_init(&mut self) -> Result<(), BootstrapError> {
        if self.phase == Phase::Ready {
            return Ok(());
        }
        self.require_phase(Phase::Enabled)?;

        let mut registries = match self.pending.take() {
            Some(registries) => registries,
            None => self.initialize_registries(),
        };
        let blocks = register_all(&mut registries.block_categories, self.host.block_tags(), |key| {
            BlockCategory::new(key)
        });
        let items = register_all(&mut registries.item_categories, self.host.item_tags(), |key| {
            ItemCategory::new(key)
        });
        info!(
            "event=tags_registered module=bootstrap status=ok block_tags={} item_tags={}",
            blocks, items
        );

        registries.mark_initialized();
        self.registries.set(registries);
        self.platforms.announce_ready(self.platform.name())?;
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Announces unready, unregisters and invalidates everything.
    ///
    /// Safe to call from any phase; repeated calls are no-ops. The platform
    /// is only unregistered when `on_load` registered it.
    pub fn on_disable(&mut self) {
        if self.phase == Phase::Disabled {
            return;
        }
        let name = self.platform.name().to_string();
        if matches!(self.phase, Phase::Loaded | Phase::Enabled | Phase::Ready) {
            self.platforms.announce_unready(&name);
            self.platforms.unregister(&name);
        }

        if self.adapter.is_valid() {
            self.adapter.invalidate();
            self.events().post(&Event::AdapterInvalidated);
        }
        self.registries.invalidate();
        self.pending = None;
        self.adapter_status = AdapterStatus::NotAttempted;
        self.phase = Phase::Disabled;
        info!(
            "event=bootstrap_disabled module=bootstrap status=ok platform={}",
            name
        );
    }

    fn require_phase(&self, expected: Phase) -> Result<(), BootstrapError> {
        if self.phase != expected {
            return Err(BootstrapError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn load_adapter(&self) -> AdapterStatus {
        let info = self.host.info();
        let err = match self
            .loader
            .load_into(&self.adapter, &info, self.platforms.events())
        {
            Ok(()) => {
                return self
                    .adapter
                    .read()
                    .map(|loaded| AdapterStatus::Loaded(loaded.name().to_string()))
                    .unwrap_or(AdapterStatus::Unavailable);
            }
            Err(err) => err,
        };

        match self.platforms.query_capability(Capability::WorldEditing) {
            Some(serving) if serving.name() != self.platform.name() => {
                info!(
                    "event=adapter_unavailable module=bootstrap status=skipped handled_by={} message=\"another implementation handles world editing\"",
                    serving.name()
                );
                AdapterStatus::HandledBy(serving.name().to_string())
            }
            serving => {
                warn!(
                    "event=adapter_unavailable module=bootstrap status=error platform={} message=\"{}\"",
                    serving.as_ref().map(|p| p.name()).unwrap_or("none"),
                    err
                );
                if serving.is_some() && info.variant == HostVariant::CraftBukkit {
                    warn!(
                        "event=adapter_unavailable module=bootstrap status=error message=\"CraftBukkit is not a supported host; use a supported variant such as Paper\""
                    );
                }
                AdapterStatus::Unavailable
            }
        }
    }

    fn initialize_registries(&self) -> TypeRegistries {
        let mut registries = TypeRegistries::new(&self.config.default_namespace);

        let biomes: Vec<String> = self
            .host
            .biomes()
            .into_iter()
            .filter(|key| key != PLACEHOLDER_BIOME)
            .collect();
        let biome_count = register_all(&mut registries.biomes, biomes, |key| BiomeType::new(key));

        let mut block_count = 0;
        let mut item_count = 0;
        for material in self.host.materials() {
            if material.is_block
                && register_one(
                    &mut registries.blocks,
                    &material.key,
                    BlockType::new(material.key.as_str()),
                )
            {
                block_count += 1;
            }
            if material.is_item
                && register_one(
                    &mut registries.items,
                    &material.key,
                    ItemType::new(material.key.as_str(), material.is_block),
                )
            {
                item_count += 1;
            }
        }

        let entity_count = register_all(
            &mut registries.entities,
            self.host.entity_types(),
            |key| EntityType::new(key),
        );

        if let Some(loaded) = self.adapter.read() {
            if let Err(err) = loaded.adapter.initialize_registries(&mut registries) {
                warn!(
                    "event=adapter_registries_failed module=bootstrap status=error adapter={} error={}",
                    loaded.name(),
                    err
                );
            }
        }

        info!(
            "event=registries_populated module=bootstrap status=ok blocks={} items={} biomes={} entities={} fluids={}",
            block_count,
            item_count,
            biome_count,
            entity_count,
            registries.fluids.len()
        );
        registries
    }
}

fn register_all<V>(
    registry: &mut NamespacedRegistry<V>,
    keys: Vec<String>,
    build: impl Fn(&str) -> V,
) -> usize {
    keys.iter()
        .filter(|key| register_one(registry, key, build(key)))
        .count()
}

/// Registers one host-reported entry, logging and skipping bad data.
fn register_one<V>(registry: &mut NamespacedRegistry<V>, key: &str, value: V) -> bool {
    match registry.register(key, value) {
        Ok(_) => true,
        Err(err) => {
            warn!(
                "event=registry_entry_skipped module=bootstrap status=error registry={} error={}",
                registry.id(),
                err
            );
            false
        }
    }
}
