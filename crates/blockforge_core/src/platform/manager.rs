//! Capability-based platform manager.
//!
//! # Responsibility
//! - Own the registration table of every live platform.
//! - Answer "who serves capability X" with the highest-priority claimant.
//! - Announce set changes and readiness transitions on the event bus.
//!
//! # Invariants
//! - Queries share a read lock; register/unregister take the write lock.
//! - Events are posted after the table lock is released.
//! - Priority ties resolve to the earliest registration.
//! - `PlatformUnready` for a ready platform precedes its removal.
//! - A platform being unregistered cannot be announced ready again.

use crate::event::{Event, EventBus};
use crate::platform::capability::{Capability, SideEffect};
use crate::platform::{Platform, PlatformError};
use log::{info, warn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

struct Registration {
    platform: Arc<dyn Platform>,
    name: String,
    capabilities: BTreeSet<Capability>,
    priority: i32,
}

#[derive(Default)]
struct RegistrationTable {
    /// Registration order.
    entries: Vec<Registration>,
    ready: BTreeSet<String>,
    /// Still registered, but `unregister` is in progress.
    leaving: BTreeSet<String>,
}

impl RegistrationTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    fn best_for(&self, capability: Capability) -> Option<&Registration> {
        let mut best: Option<&Registration> = None;
        for entry in self
            .entries
            .iter()
            .filter(|entry| entry.capabilities.contains(&capability))
        {
            match best {
                Some(current) if current.priority >= entry.priority => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}

/// Registry of platform implementations keyed by identity.
pub struct PlatformManager {
    table: RwLock<RegistrationTable>,
    events: Arc<EventBus>,
}

impl PlatformManager {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            table: RwLock::new(RegistrationTable::default()),
            events,
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Adds a platform and posts `PlatformsChanged`.
    ///
    /// Capabilities and priority are captured at registration time.
    ///
    /// # Errors
    /// - `InvalidName` when the platform name is blank.
    /// - `DuplicateRegistration` when the name is already registered.
    pub fn register(&self, platform: Arc<dyn Platform>) -> Result<(), PlatformError> {
        let name = platform.name().trim().to_string();
        if name.is_empty() {
            return Err(PlatformError::InvalidName(platform.name().to_string()));
        }

        {
            let mut table = self.table.write();
            if table.position(&name).is_some() {
                return Err(PlatformError::DuplicateRegistration(name));
            }
            let capabilities = platform.capabilities();
            info!(
                "event=platform_registered module=platform status=ok platform={} version={} priority={} capabilities={}",
                name,
                platform.version(),
                platform.priority(),
                join_capabilities(&capabilities)
            );
            table.entries.push(Registration {
                priority: platform.priority(),
                platform,
                name,
                capabilities,
            });
        }

        self.events.post(&Event::PlatformsChanged);
        Ok(())
    }

    /// Removes a platform. Returns whether it was registered.
    ///
    /// A ready platform is announced unready first, while still registered.
    pub fn unregister(&self, name: &str) -> bool {
        let name = name.trim();
        let (claimed, was_ready) = {
            let mut table = self.table.write();
            if table.position(name).is_some() && table.leaving.insert(name.to_string()) {
                (true, table.ready.remove(name))
            } else {
                (false, false)
            }
        };

        if was_ready {
            info!(
                "event=platform_unready module=platform status=ok platform={}",
                name
            );
            self.events.post(&Event::PlatformUnready {
                platform: name.to_string(),
            });
        }

        let removed = claimed && {
            let mut table = self.table.write();
            table.leaving.remove(name);
            match table.position(name) {
                Some(index) => {
                    table.entries.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            info!(
                "event=platform_unregistered module=platform status=ok platform={}",
                name
            );
            self.events.post(&Event::PlatformsChanged);
        } else {
            warn!(
                "event=platform_unregistered module=platform status=skipped platform={} reason=not_registered",
                name
            );
        }
        removed
    }

    /// Returns the highest-priority platform serving `capability`.
    pub fn query_capability(&self, capability: Capability) -> Option<Arc<dyn Platform>> {
        self.table
            .read()
            .best_for(capability)
            .map(|entry| Arc::clone(&entry.platform))
    }

    /// Like `query_capability`, but with a user-facing error.
    pub fn require(&self, capability: Capability) -> Result<Arc<dyn Platform>, PlatformError> {
        self.query_capability(capability)
            .ok_or(PlatformError::NoCapablePlatform(capability))
    }

    /// Side effects of the platform currently serving world editing.
    pub fn supported_side_effects(&self) -> BTreeSet<SideEffect> {
        self.query_capability(Capability::WorldEditing)
            .map(|platform| platform.supported_side_effects())
            .unwrap_or_default()
    }

    /// Capability -> serving platform name, for every served capability.
    pub fn capability_table(&self) -> BTreeMap<Capability, String> {
        let table = self.table.read();
        Capability::ALL
            .into_iter()
            .filter_map(|capability| {
                table
                    .best_for(capability)
                    .map(|entry| (capability, entry.name.clone()))
            })
            .collect()
    }

    /// Registered platforms in registration order.
    pub fn platforms(&self) -> Vec<Arc<dyn Platform>> {
        self.table
            .read()
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.platform))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().entries.is_empty()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.table.read().position(name.trim()).is_some()
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.table.read().ready.contains(name.trim())
    }

    /// Marks `name` ready and posts `PlatformReady` on the transition.
    ///
    /// # Errors
    /// - `NotRegistered` when `name` is not in the table.
    pub fn announce_ready(&self, name: &str) -> Result<(), PlatformError> {
        let name = name.trim();
        let changed = {
            let mut table = self.table.write();
            if table.position(name).is_none() || table.leaving.contains(name) {
                return Err(PlatformError::NotRegistered(name.to_string()));
            }
            table.ready.insert(name.to_string())
        };

        if changed {
            info!(
                "event=platform_ready module=platform status=ok platform={}",
                name
            );
            self.events.post(&Event::PlatformReady {
                platform: name.to_string(),
            });
        }
        Ok(())
    }

    /// Clears readiness and posts `PlatformUnready` on the transition.
    ///
    /// Returns whether the platform was ready.
    pub fn announce_unready(&self, name: &str) -> bool {
        let name = name.trim();
        let changed = self.table.write().ready.remove(name);
        if changed {
            info!(
                "event=platform_unready module=platform status=ok platform={}",
                name
            );
            self.events.post(&Event::PlatformUnready {
                platform: name.to_string(),
            });
        }
        changed
    }
}

fn join_capabilities(capabilities: &BTreeSet<Capability>) -> String {
    capabilities
        .iter()
        .map(|capability| capability.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
