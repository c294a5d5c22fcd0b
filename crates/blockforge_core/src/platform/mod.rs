//! Host-facing platform contracts and capability routing.
//!
//! # Responsibility
//! - Define what a registrable platform declares (identity, capabilities,
//!   priority weight, side effects).
//! - Route capability queries to the best-ranked registered platform.
//!
//! # Invariants
//! - Platform identities are unique within one manager.
//! - An absent capability answer means "feature unavailable", never a crash.

pub mod capability;
pub mod manager;

use crate::platform::capability::{Capability, SideEffect};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One implementation of the host-facing interface.
pub trait Platform: Send + Sync {
    /// Stable identity, used for logging and duplicate detection.
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "unknown"
    }

    /// Capabilities this platform claims to serve.
    fn capabilities(&self) -> BTreeSet<Capability>;

    /// Weight used when several platforms claim the same capability.
    /// Higher wins.
    fn priority(&self) -> i32 {
        0
    }

    fn supported_side_effects(&self) -> BTreeSet<SideEffect> {
        BTreeSet::new()
    }
}

/// Declaration-only platform, for companion extensions that only need to
/// claim capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    pub name: String,
    pub version: String,
    pub capabilities: BTreeSet<Capability>,
    pub priority: i32,
    pub side_effects: BTreeSet<SideEffect>,
}

impl PlatformDescriptor {
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            name: name.into(),
            version: "unknown".to_string(),
            capabilities: capabilities.into_iter().collect(),
            priority,
            side_effects: BTreeSet::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_side_effects(mut self, side_effects: impl IntoIterator<Item = SideEffect>) -> Self {
        self.side_effects = side_effects.into_iter().collect();
        self
    }
}

impl Platform for PlatformDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn capabilities(&self) -> BTreeSet<Capability> {
        self.capabilities.clone()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn supported_side_effects(&self) -> BTreeSet<SideEffect> {
        self.side_effects.clone()
    }
}

/// Platform registration and routing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    InvalidName(String),
    DuplicateRegistration(String),
    NotRegistered(String),
    NoCapablePlatform(Capability),
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "platform name is invalid: `{value}`"),
            Self::DuplicateRegistration(value) => {
                write!(f, "platform already registered: {value}")
            }
            Self::NotRegistered(value) => write!(f, "platform is not registered: {value}"),
            Self::NoCapablePlatform(capability) => write!(
                f,
                "{} is not available: no platform currently supports it",
                capability.description()
            ),
        }
    }
}

impl Error for PlatformError {}
