//! Tool and config-file versions
//!
//! A config file may declare the mod-downloader version it was written for.
//! Parsing rejects files declaring a version newer than the running tool.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// A `major.minor.patch` version with an optional `-SNAPSHOT` marker
///
/// Ordering compares the numeric triple first. At equal triples a snapshot
/// sorts before the stable release it leads up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub snapshot: bool,
}

/// The version string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version name: {0}")]
pub struct VersionParseError(pub String);

impl Version {
    /// Version of this build of the tool
    pub const CURRENT: Version = Version::new(0, 4, 0);

    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
            snapshot: false,
        }
    }

    pub const fn snapshot(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
            snapshot: true,
        }
    }

    /// Parse `1`, `1.2`, `1.2.3`, each optionally followed by `-SNAPSHOT`
    ///
    /// Missing components default to zero.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        let invalid = || VersionParseError(text.to_string());

        let (numbers, snapshot) = match text.strip_suffix(SNAPSHOT_SUFFIX) {
            Some(stripped) => (stripped, true),
            None => (text, false),
        };

        let mut parts = numbers.splitn(3, '.');
        let mut component = |required: bool| -> Result<u8, VersionParseError> {
            match parts.next() {
                Some(part) => part.parse::<u8>().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };

        let major = component(true)?;
        let minor = component(false)?;
        let patch = component(false)?;

        Ok(Self {
            major,
            minor,
            patch,
            snapshot,
        })
    }

    /// The same triple without the snapshot marker
    pub fn stabilized(self) -> Self {
        Self {
            snapshot: false,
            ..self
        }
    }

    /// Whether a config declaring this version can be read by a tool at `current`
    ///
    /// Anything newer than `current` is rejected. Because snapshots sort
    /// before their release, a snapshot tool rejects configs declaring the
    /// finished release while a release tool accepts configs declaring the
    /// snapshot that preceded it.
    pub fn is_supported(self, current: Version) -> bool {
        self <= current
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            // stable > snapshot
            .then(self.snapshot.cmp(&other.snapshot).reverse())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.snapshot {
            f.write_str(SNAPSHOT_SUFFIX)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}
