use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Facts about on-premises directory synchronisation (Azure AD Connect).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySync {
    /// Provisioning status as reported by the tenant, e.g. `Enabled`.
    pub status: Option<String>,
    /// Version string of the synchronisation client, e.g. `1.6.4.0`.
    pub client_version: Option<String>,
}

impl DirectorySync {
    /// Only the exact `Enabled` status the tenant reports counts.
    pub fn is_enabled(&self) -> bool {
        self.status.as_deref() == Some("Enabled")
    }

    /// Parsed client version, if present and well formed.
    pub fn version(&self) -> Option<ClientVersion> {
        self.client_version.as_deref().and_then(ClientVersion::parse)
    }
}

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\.(\d+)(?:\.(\d+)(?:\.(\d+))?)?\s*$").unwrap()
});

/// Dotted version with two to four numeric components.
///
/// Missing trailing components order before any present one, so
/// `1.6 < 1.6.0 < 1.6.0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl ClientVersion {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build: Some(build),
            revision: Some(revision),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(s)?;
        let component = |i: usize| -> Option<Option<u32>> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok().map(Some),
                None => Some(None),
            }
        };
        Some(Self {
            major: component(1)??,
            minor: component(2)??,
            build: component(3)?,
            revision: component(4)?,
        })
    }
}

impl std::fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
            if let Some(revision) = self.revision {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}
