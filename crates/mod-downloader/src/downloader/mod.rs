//! Downloader module
//!
//! This module contains all the download functionality including
//! core types, configuration, sources, the manifest and the run itself.

pub mod config;
pub mod core;
pub mod diff;
pub mod manifest;
pub mod runner;
pub mod sources;

// Re-export main types for convenience
pub use config::DownloadConfig;
pub use core::{
    DownloadError, ErrorKind, FetchedFile, FileBody, FileOperation, NullProgressSink, ProgressSink, Result,
    SharedProgressSink, TracingProgressSink,
};
pub use diff::{ModDiff, compute_mod_diff, filter_mods};
pub use manifest::{DownloadedMod, MANIFEST_FILE_NAME, load_manifest, save_manifest};
pub use runner::{DownloadMode, DownloadParameters, Downloader, RunResult};

// Re-export source types
pub use sources::{CurseSource, DownloadSource, DriveSource, OptifineSource, UrlSource, ZipSource};
