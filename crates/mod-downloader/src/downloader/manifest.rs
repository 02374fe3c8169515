//! Record of what a previous run downloaded
//!
//! Stored as `downloaded.txt` in the target directory:
//!
//! ```text
//! This file is the list of mods downloaded by mod-downloader
//! BEGIN
//! fixrtm"3522183"fixRtm-2.0.20.jar
//! pack"3"config/a.cfg"mods/b.jar
//! ```
//!
//! Fields are separated by `"` and are not escaped.

use std::fmt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::downloader::core::files::all_exist;
use crate::downloader::core::{DownloadError, FileOperation, Result};

pub const MANIFEST_FILE_NAME: &str = "downloaded.txt";

const HEADER: &str = "This file is the list of mods downloaded by mod-downloader";
const BEGIN: &str = "BEGIN";
const SEPARATOR: char = '"';

/// One mod recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadedMod {
    pub id: String,
    pub version_id: String,
    /// `/`-separated paths relative to the target directory
    pub files: Vec<String>,
}

impl DownloadedMod {
    pub fn new(id: impl Into<String>, version_id: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            id: id.into(),
            version_id: version_id.into(),
            files,
        }
    }
}

impl fmt::Display for DownloadedMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} version {}: {}", self.id, self.version_id, self.files.join(", "))
    }
}

/// Parse manifest text; lines before the first `BEGIN` are ignored
pub fn parse_manifest(text: &str) -> Vec<DownloadedMod> {
    text.lines()
        .skip_while(|line| *line != BEGIN)
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split(SEPARATOR);
            let id = parts.next()?;
            let version_id = parts.next()?;
            let files: Vec<String> = parts.map(str::to_string).collect();
            if files.is_empty() {
                return None;
            }
            Some(DownloadedMod::new(id, version_id, files))
        })
        .collect()
}

pub fn write_manifest(mods: &[DownloadedMod]) -> String {
    let mut text = format!("{HEADER}\n{BEGIN}\n");
    for downloaded in mods {
        text.push_str(&downloaded.id);
        text.push(SEPARATOR);
        text.push_str(&downloaded.version_id);
        for file in &downloaded.files {
            text.push(SEPARATOR);
            text.push_str(file);
        }
        text.push('\n');
    }
    text
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE_NAME)
}

/// Read the manifest entries of `dir` exactly as recorded
///
/// A missing manifest file is an empty manifest.
pub async fn read_manifest(dir: &Path) -> Result<Vec<DownloadedMod>> {
    let path = manifest_path(dir);
    match fs::read_to_string(&path).await {
        Ok(text) => Ok(parse_manifest(&text)),
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            debug!("No manifest at {}", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(DownloadError::file_system(path, FileOperation::Read, e)),
    }
}

/// Drop entries with any recorded file missing under `dir`
///
/// `on_missing` is called for every dropped entry.
pub async fn retain_present(
    dir: &Path,
    mods: Vec<DownloadedMod>,
    mut on_missing: impl FnMut(&DownloadedMod),
) -> Vec<DownloadedMod> {
    let mut present = Vec::with_capacity(mods.len());
    for downloaded in mods {
        if all_exist(dir, &downloaded.files).await {
            present.push(downloaded);
        } else {
            warn!(
                "Dropping manifest entry {} version {}: files missing",
                downloaded.id, downloaded.version_id
            );
            on_missing(&downloaded);
        }
    }
    present
}

/// Manifest entries of `dir` whose files all still exist
pub async fn load_manifest(dir: &Path) -> Result<Vec<DownloadedMod>> {
    let mods = read_manifest(dir).await?;
    Ok(retain_present(dir, mods, |_| {}).await)
}

/// Overwrite the manifest of `dir` with `mods`
pub async fn save_manifest(dir: &Path, mods: &[DownloadedMod]) -> std::io::Result<()> {
    fs::write(manifest_path(dir), write_manifest(mods)).await
}
