use blockforge_core::{
    host_platform, AdapterCandidate, AdapterLoader, AdapterStatus, Bootstrap, BootstrapError,
    Capability, CandidateSource, CoreConfig, Event, EventBus, EventKind, HostAdapter, HostData,
    HostInfo, HostVariant, HostVersion, MaterialEntry, Phase, Platform, PlatformDescriptor,
    PlatformError, PlatformManager, VersionRange,
};
use parking_lot::Mutex;
use std::sync::Arc;

struct ScriptedHost {
    info: HostInfo,
    worlds_loaded: bool,
}

impl HostData for ScriptedHost {
    fn info(&self) -> HostInfo {
        self.info.clone()
    }

    fn biomes(&self) -> Vec<String> {
        vec!["minecraft:plains".into(), "minecraft:desert".into()]
    }

    fn materials(&self) -> Vec<MaterialEntry> {
        vec![
            MaterialEntry::new("minecraft:stone", true, true),
            MaterialEntry::new("minecraft:oak_log", true, true),
            MaterialEntry::new("minecraft:diamond", false, true),
        ]
    }

    fn entity_types(&self) -> Vec<String> {
        vec!["minecraft:pig".into()]
    }

    fn block_tags(&self) -> Vec<String> {
        vec!["minecraft:logs".into()]
    }

    fn item_tags(&self) -> Vec<String> {
        vec!["minecraft:logs".into()]
    }

    fn worlds_loaded(&self) -> bool {
        self.worlds_loaded
    }
}

struct NamedAdapter(&'static str);

impl HostAdapter for NamedAdapter {
    fn name(&self) -> &str {
        self.0
    }

    fn data_version(&self) -> u32 {
        3337
    }
}

fn loader() -> AdapterLoader {
    let mut loader = AdapterLoader::new();
    loader.add_candidate(AdapterCandidate::new(
        "legacy",
        CandidateSource::BundledArchive,
        VersionRange::new(13, 17),
        |_| Ok(Box::new(NamedAdapter("legacy")) as Box<dyn HostAdapter>),
    ));
    loader.add_candidate(AdapterCandidate::new(
        "modern",
        CandidateSource::BundledArchive,
        VersionRange::new(18, 20),
        |_| Ok(Box::new(NamedAdapter("modern")) as Box<dyn HostAdapter>),
    ));
    loader
}

fn record_all(bus: &EventBus) -> Arc<Mutex<Vec<Event>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        EventKind::PlatformsChanged,
        EventKind::PlatformReady,
        EventKind::PlatformUnready,
        EventKind::AdapterLoaded,
        EventKind::AdapterInvalidated,
    ] {
        let log = Arc::clone(&log);
        bus.subscribe(kind, move |event| {
            log.lock().push(event.clone());
            Ok(())
        });
    }
    log
}

fn bootstrap(release: u32, worlds_loaded: bool) -> (Bootstrap, Arc<Mutex<Vec<Event>>>) {
    let config = CoreConfig::default();
    let bus = Arc::new(EventBus::new());
    let log = record_all(&bus);
    let manager = Arc::new(PlatformManager::new(bus));
    let platform = Arc::new(host_platform("paper-host", "7.3.0", &config));
    let host = Arc::new(ScriptedHost {
        info: HostInfo::new(HostVersion::new(1, release, 2), HostVariant::Paper),
        worlds_loaded,
    });
    (
        Bootstrap::new(config, host, platform, manager, loader()),
        log,
    )
}

#[test]
fn full_lifecycle_posts_events_in_order() {
    let (mut bootstrap, log) = bootstrap(19, false);
    bootstrap.on_load().expect("load");
    bootstrap.on_enable().expect("enable");
    bootstrap.on_world_init().expect("world init");
    bootstrap.on_disable();

    let events = log.lock().clone();
    assert_eq!(
        events,
        vec![
            Event::PlatformsChanged,
            Event::PlatformsChanged,
            Event::AdapterLoaded {
                adapter: "modern".to_string()
            },
            Event::PlatformReady {
                platform: "paper-host".to_string()
            },
            Event::PlatformUnready {
                platform: "paper-host".to_string()
            },
            Event::PlatformsChanged,
            Event::AdapterInvalidated,
        ]
    );
}

#[test]
fn ready_session_exposes_adapter_and_registries() {
    let (mut bootstrap, _log) = bootstrap(16, true);
    bootstrap.on_load().expect("load");
    bootstrap.on_enable().expect("enable");
    assert_eq!(bootstrap.phase(), Phase::Ready);

    let adapter = bootstrap.adapter().read().expect("adapter loaded");
    assert_eq!(adapter.name(), "legacy");
    assert_eq!(adapter.range, VersionRange::new(13, 17));

    let registries = bootstrap.registries().read().expect("registries published");
    assert_eq!(registries.blocks.len(), 2);
    assert_eq!(registries.items.len(), 3);
    assert!(registries.block_categories.contains_key("logs"));
    assert!(registries.item_categories.contains_key("minecraft:logs"));
    assert!(registries.biomes.get("desert").is_some());
}

#[test]
fn companion_platform_keeps_world_editing_after_host_leaves() {
    let (mut bootstrap, _log) = bootstrap(19, false);
    let companion = PlatformDescriptor::new("fabric-bridge", 10, [Capability::WorldEditing]);
    bootstrap
        .platforms()
        .register(Arc::new(companion))
        .expect("companion registration");

    bootstrap.on_load().expect("load");
    bootstrap.on_enable().expect("enable");
    bootstrap.on_world_init().expect("world init");

    let table = bootstrap.platforms().capability_table();
    assert_eq!(
        table.get(&Capability::WorldEditing).map(String::as_str),
        Some("fabric-bridge")
    );
    assert_eq!(
        table.get(&Capability::Permissions).map(String::as_str),
        Some("paper-host")
    );

    bootstrap.on_disable();
    let remaining = bootstrap.platforms().capability_table();
    assert_eq!(remaining.len(), 1);
    assert!(bootstrap.platforms().is_registered("fabric-bridge"));
}

#[test]
fn unmatched_host_runs_without_adapter() {
    let (mut bootstrap, log) = bootstrap(25, false);
    bootstrap.on_load().expect("load");
    bootstrap.on_enable().expect("enable");
    bootstrap.on_world_init().expect("world init");

    assert!(bootstrap.adapter().read().is_none());
    assert_eq!(bootstrap.adapter_status(), &AdapterStatus::Unavailable);
    assert!(bootstrap.registries().is_valid());
    assert!(log.lock().contains(&Event::AdapterInvalidated));
}

#[test]
fn failed_load_does_not_unregister_a_foreign_platform() {
    let (mut bootstrap, _log) = bootstrap(19, false);
    let companion = PlatformDescriptor::new("paper-host", 10, [Capability::WorldEditing]);
    bootstrap
        .platforms()
        .register(Arc::new(companion))
        .expect("companion registration");

    let err = bootstrap.on_load().expect_err("name is already taken");
    assert_eq!(
        err,
        BootstrapError::Platform(PlatformError::DuplicateRegistration(
            "paper-host".to_string()
        ))
    );
    bootstrap.on_disable();

    assert_eq!(bootstrap.phase(), Phase::Disabled);
    assert!(bootstrap.platforms().is_registered("paper-host"));
    assert_eq!(
        bootstrap
            .platforms()
            .query_capability(Capability::WorldEditing)
            .map(|platform| platform.priority()),
        Some(10)
    );
}

#[test]
fn missing_adapter_defers_to_companion_serving_world_editing() {
    let (mut bootstrap, log) = bootstrap(25, false);
    let companion = PlatformDescriptor::new("fabric-bridge", 10, [Capability::WorldEditing]);
    bootstrap
        .platforms()
        .register(Arc::new(companion))
        .expect("companion registration");

    bootstrap.on_load().expect("load");
    bootstrap.on_enable().expect("enable despite missing adapter");
    bootstrap.on_world_init().expect("world init");

    assert_eq!(
        bootstrap.adapter_status(),
        &AdapterStatus::HandledBy("fabric-bridge".to_string())
    );
    assert!(bootstrap.adapter().read().is_none());
    assert!(bootstrap.platforms().is_ready("paper-host"));
    assert!(log.lock().contains(&Event::AdapterInvalidated));
}
