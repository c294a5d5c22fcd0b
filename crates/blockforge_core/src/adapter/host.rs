//! Host identity: version and vendor variant.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?(?:[-+].*)?$").expect("host version pattern is valid")
});

/// Oldest host release line the core can run on.
pub const MIN_SUPPORTED_RELEASE: u32 = 13;

/// Parsed host version, e.g. `1.19.4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HostVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `major.minor[.patch]` with optional `-build`/`+meta` suffix.
    pub fn parse(value: &str) -> Result<Self, HostVersionError> {
        let trimmed = value.trim();
        let captures = VERSION_PATTERN
            .captures(trimmed)
            .ok_or_else(|| HostVersionError::Malformed(trimmed.to_string()))?;
        let component = |index: usize| -> Result<u32, HostVersionError> {
            match captures.get(index) {
                Some(raw) => raw
                    .as_str()
                    .parse()
                    .map_err(|_| HostVersionError::Malformed(trimmed.to_string())),
                None => Ok(0),
            }
        };
        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Release line used for adapter compatibility (`19` for `1.19.4`).
    pub fn release(&self) -> u32 {
        self.minor
    }
}

impl Display for HostVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Host version parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostVersionError {
    Malformed(String),
}

impl Display for HostVersionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "host version is malformed: `{value}`"),
        }
    }
}

impl Error for HostVersionError {}

/// Vendor flavour of the embedding host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostVariant {
    Paper,
    Spigot,
    CraftBukkit,
    Other(String),
}

impl HostVariant {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "paper" => Self::Paper,
            "spigot" => Self::Spigot,
            "craftbukkit" => Self::CraftBukkit,
            _ => Self::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paper => "paper",
            Self::Spigot => "spigot",
            Self::CraftBukkit => "craftbukkit",
            Self::Other(name) => name,
        }
    }
}

impl Display for HostVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the embedding host reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub version: HostVersion,
    pub variant: HostVariant,
}

impl HostInfo {
    pub fn new(version: HostVersion, variant: HostVariant) -> Self {
        Self { version, variant }
    }

    pub fn is_supported(&self) -> bool {
        self.version.release() >= MIN_SUPPORTED_RELEASE
    }
}
