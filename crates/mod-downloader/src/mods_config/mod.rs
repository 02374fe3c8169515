//! Mods config model and its text format
//!
//! A config file lists the mods to download, one `mod` block each, with an
//! optional leading `version` declaration naming the tool version it targets.

pub mod parser;
pub mod reader;
pub mod tokenizer;

pub use parser::{ParseError, Parser};

use std::fmt;

use crate::downloader::sources::DownloadSource;
use crate::version::Version;

/// Which installation a mod is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModSide {
    Client,
    Server,
}

impl fmt::Display for ModSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModSide::Client => f.write_str("client"),
            ModSide::Server => f.write_str("server"),
        }
    }
}

/// One `mod` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub id: String,
    pub source: DownloadSource,
    pub version_id: String,
    /// Human readable version shown in progress output, from `(...)`
    pub version_name: Option<String>,
    pub optional: bool,
    pub side: Option<ModSide>,
}

impl ModEntry {
    /// Version label for progress lines
    pub fn display_version(&self) -> &str {
        self.version_name.as_deref().unwrap_or(&self.version_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModsConfig {
    /// Declared tool version; already checked against the tool when present
    pub version: Option<Version>,
    pub mods: Vec<ModEntry>,
}

/// Parse config `text` read from `file_name` against [`Version::CURRENT`]
pub fn parse_config(file_name: &str, text: &str) -> Result<ModsConfig, ParseError> {
    Parser::new(file_name, text).parse()
}
