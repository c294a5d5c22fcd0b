//! Capability and side-effect declarations for registered platforms.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One axis of host behavior that exactly one platform ends up serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Configuration,
    WorldEditCui,
    GameHooks,
    Permissions,
    UserCommands,
    WorldEditing,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Self::Configuration,
        Self::WorldEditCui,
        Self::GameHooks,
        Self::Permissions,
        Self::UserCommands,
        Self::WorldEditing,
    ];

    /// Stable string id used in logs and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::WorldEditCui => "worldedit_cui",
            Self::GameHooks => "game_hooks",
            Self::Permissions => "permissions",
            Self::UserCommands => "user_commands",
            Self::WorldEditing => "world_editing",
        }
    }

    /// User-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Configuration => "configuration loading",
            Self::WorldEditCui => "client-side selection display",
            Self::GameHooks => "game hooks and host registries",
            Self::Permissions => "permission checks",
            Self::UserCommands => "user command registration",
            Self::WorldEditing => "world editing",
        }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one capability from its string id.
pub fn parse_capability(value: &str) -> Result<Capability, CapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(CapabilityError::EmptyCapability);
    }
    Capability::ALL
        .into_iter()
        .find(|capability| capability.as_str() == normalized)
        .ok_or_else(|| CapabilityError::UnsupportedCapability(normalized.to_string()))
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "capability value must not be empty"),
            Self::UnsupportedCapability(value) => write!(f, "capability is unsupported: {value}"),
        }
    }
}

impl Error for CapabilityError {}

/// Secondary effect a platform may apply while mutating the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SideEffect {
    Lighting,
    Neighbors,
    Update,
    Validation,
    EntityAi,
    Events,
    History,
    Heightmaps,
    PoiUpdate,
    Network,
}

impl SideEffect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lighting => "lighting",
            Self::Neighbors => "neighbors",
            Self::Update => "update",
            Self::Validation => "validation",
            Self::EntityAi => "entity_ai",
            Self::Events => "events",
            Self::History => "history",
            Self::Heightmaps => "heightmaps",
            Self::PoiUpdate => "poi_update",
            Self::Network => "network",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_capability, Capability, CapabilityError};

    #[test]
    fn parses_every_capability_id() {
        for capability in Capability::ALL {
            assert_eq!(
                parse_capability(capability.as_str()).expect("known id should parse"),
                capability
            );
        }
    }

    #[test]
    fn rejects_empty_and_unknown_ids() {
        assert_eq!(
            parse_capability("  ").expect_err("blank must fail"),
            CapabilityError::EmptyCapability
        );
        assert_eq!(
            parse_capability("WORLD_EDITING").expect_err("uppercase must fail"),
            CapabilityError::UnsupportedCapability("WORLD_EDITING".to_string())
        );
    }

    #[test]
    fn descriptions_are_user_facing() {
        assert_eq!(Capability::WorldEditing.description(), "world editing");
        assert!(Capability::Permissions.description().contains("permission"));
    }
}
