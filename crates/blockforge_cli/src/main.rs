//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `blockforge_core` linkage.
//! - Drive one simulated host session through every bootstrap phase and
//!   print the resulting capability routing, adapter and registry contents.
//!
//! Usage: `blockforge_cli [config.json]`

use blockforge_core::{
    host_platform, search_registry_by_id, AdapterCandidate, AdapterLoader, Bootstrap, BootstrapError,
    CandidateSource, CoreConfig, EventBus, HostAdapter, HostData, HostInfo, HostVariant,
    HostVersion, MaterialEntry, PlatformManager, RegistryQuery, VersionRange,
};
use std::process::ExitCode;
use std::sync::Arc;

/// Paper host on release 19 with a handful of vanilla materials.
struct DemoHost;

impl HostData for DemoHost {
    fn info(&self) -> HostInfo {
        HostInfo::new(HostVersion::new(1, 19, 4), HostVariant::Paper)
    }

    fn biomes(&self) -> Vec<String> {
        ["plains", "desert", "custom"]
            .iter()
            .map(|name| format!("minecraft:{name}"))
            .collect()
    }

    fn materials(&self) -> Vec<MaterialEntry> {
        vec![
            MaterialEntry::new("minecraft:stone", true, true),
            MaterialEntry::new("minecraft:oak_log", true, true),
            MaterialEntry::new("minecraft:spruce_log", true, true),
            MaterialEntry::new("minecraft:water", true, false),
            MaterialEntry::new("minecraft:stick", false, true),
        ]
    }

    fn entity_types(&self) -> Vec<String> {
        vec!["minecraft:pig".into(), "minecraft:creeper".into()]
    }

    fn block_tags(&self) -> Vec<String> {
        vec!["minecraft:logs".into()]
    }

    fn item_tags(&self) -> Vec<String> {
        vec!["minecraft:logs".into()]
    }

    fn worlds_loaded(&self) -> bool {
        false
    }
}

struct DemoAdapter {
    name: &'static str,
    data_version: u32,
}

impl HostAdapter for DemoAdapter {
    fn name(&self) -> &str {
        self.name
    }

    fn data_version(&self) -> u32 {
        self.data_version
    }
}

fn demo_loader(config: &CoreConfig) -> AdapterLoader {
    let mut loader = AdapterLoader::from_config(&config.adapters);
    loader.add_from_source(
        CandidateSource::BundledArchive,
        [
            AdapterCandidate::new(
                "adapter_1_13",
                CandidateSource::BundledArchive,
                VersionRange::new(13, 17),
                |_| {
                    Ok(Box::new(DemoAdapter {
                        name: "adapter_1_13",
                        data_version: 1519,
                    }) as Box<dyn HostAdapter>)
                },
            ),
            AdapterCandidate::new(
                "adapter_1_18",
                CandidateSource::BundledArchive,
                VersionRange::new(18, 20),
                |_| {
                    Ok(Box::new(DemoAdapter {
                        name: "adapter_1_18",
                        data_version: 3337,
                    }) as Box<dyn HostAdapter>)
                },
            ),
        ],
    );
    loader
}

fn load_config(path: Option<String>) -> Result<CoreConfig, String> {
    let Some(path) = path else {
        return Ok(CoreConfig::default());
    };
    let raw = std::fs::read_to_string(&path)
        .map_err(|err| format!("failed to read config `{path}`: {err}"))?;
    CoreConfig::from_json_str(&raw).map_err(|err| format!("invalid config `{path}`: {err}"))
}

fn start(bootstrap: &mut Bootstrap) -> Result<(), BootstrapError> {
    bootstrap.on_load()?;
    bootstrap.on_enable()?;
    bootstrap.on_world_init()
}

fn main() -> ExitCode {
    println!("blockforge_core ping={}", blockforge_core::ping());
    println!("blockforge_core version={}", blockforge_core::core_version());

    let config = match load_config(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = blockforge_core::init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let platform = Arc::new(host_platform("paper", blockforge_core::core_version(), &config));
    let platforms = Arc::new(PlatformManager::new(Arc::new(EventBus::new())));
    let loader = demo_loader(&config);
    let page_size = config.search.page_size;
    let mut bootstrap = Bootstrap::new(config, Arc::new(DemoHost), platform, platforms, loader);

    if let Err(err) = start(&mut bootstrap) {
        eprintln!("startup failed: {err}");
        bootstrap.on_disable();
        return ExitCode::FAILURE;
    }

    for (capability, platform) in bootstrap.platforms().capability_table() {
        println!("capability {capability} -> {platform}");
    }
    match bootstrap.adapter().read() {
        Some(loaded) => println!(
            "adapter={} range={} data_version={}",
            loaded.name(),
            loaded.range,
            loaded.adapter.data_version()
        ),
        None => println!("adapter=none status={}", bootstrap.adapter_status()),
    }

    if let Some(registries) = bootstrap.registries().read() {
        println!("registries={}", registries.registry_ids().join(","));
        let page = RegistryQuery::parse("log").and_then(|query| {
            search_registry_by_id(&registries, "block_type", &query, 1, page_size)
        });
        match page {
            Ok(page) => {
                println!("{} (page {}/{})", page.title, page.page, page.total_pages);
                for id in page.items {
                    println!("  {id}");
                }
            }
            Err(err) => eprintln!("search failed: {err}"),
        }
    }

    bootstrap.on_disable();
    ExitCode::SUCCESS
}
