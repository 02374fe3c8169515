//! Mod Downloader Library
//!
//! Downloads the mods listed in a mods config file into a directory and
//! keeps a manifest there, so later runs only fetch what changed.
//! Supported sources are direct URLs, CurseForge projects, OptiFine,
//! Google Drive shares and zip archives produced by any of those.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mod_downloader::{DownloadConfig, DownloadParameters, Downloader, TracingProgressSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("mods.txt")?;
//! let mods = mod_downloader::parse_config("mods.txt", &text)?;
//!
//! let downloader = Downloader::new(DownloadConfig::from_env()?)?;
//! let params = DownloadParameters::new("mods").with_optional_mods(["journeymap"]);
//! let result = downloader.run(&mods, &params, &TracingProgressSink).await?;
//!
//! println!("{} downloaded, {} kept", result.downloaded.len(), result.kept.len());
//! # Ok(())
//! # }
//! ```

pub mod downloader;
pub mod mods_config;
pub mod version;

use std::path::Path;

pub use downloader::{
    CurseSource, DownloadConfig, DownloadError, DownloadMode, DownloadParameters, DownloadSource, DownloadedMod,
    Downloader, DriveSource, ErrorKind, FileOperation, ModDiff, NullProgressSink, OptifineSource, ProgressSink,
    Result, RunResult, SharedProgressSink, TracingProgressSink, UrlSource, ZipSource, compute_mod_diff,
    filter_mods,
};
pub use mods_config::{ModEntry, ModSide, ModsConfig, ParseError, parse_config};
pub use version::Version;

/// Manifest entries of `dir` whose files all still exist
pub async fn load_manifest(dir: &Path) -> Result<Vec<DownloadedMod>> {
    downloader::manifest::load_manifest(dir).await
}

/// Overwrite the manifest of `dir`
pub async fn save_manifest(dir: &Path, mods: &[DownloadedMod]) -> Result<()> {
    downloader::manifest::save_manifest(dir, mods)
        .await
        .map_err(|e| DownloadError::file_system(downloader::manifest::manifest_path(dir), FileOperation::Write, e))
}

/// Split wanted mods into ones to download, remove and keep
pub fn reconcile(mods: &[ModEntry], downloaded: &[DownloadedMod]) -> ModDiff {
    compute_mod_diff(mods, downloaded)
}

/// Run a download with [`DownloadConfig::default`]
pub async fn run(mods: &ModsConfig, params: &DownloadParameters, sink: &dyn ProgressSink) -> Result<RunResult> {
    Downloader::new(DownloadConfig::default())?.run(mods, params, sink).await
}
