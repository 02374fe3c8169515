//! Download orchestration
//!
//! One run prepares the target directory, reconciles the config with the
//! manifest of the previous run, deletes what is no longer wanted, fetches
//! everything new concurrently and records the result in the manifest.
//!
//! A failing mod never stops the others. Successful downloads are always
//! recorded, so running again only retries what failed.

use futures::future::join_all;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::files::{self, clear_directory, delete_files, is_dir_empty, remove_written};
use crate::downloader::core::{DownloadError, FileOperation, HttpClient, ProgressSink, Result};
use crate::downloader::diff::{compute_mod_diff, filter_mods};
use crate::downloader::manifest::{self, DownloadedMod};
use crate::downloader::sources::FetchContext;
use crate::mods_config::{ModEntry, ModSide, ModsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadMode {
    /// Keep what the manifest says is already there and fetch the rest
    #[default]
    Incremental,
    /// Start from an empty directory
    Clean,
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadMode::Incremental => f.write_str("download"),
            DownloadMode::Clean => f.write_str("clean download"),
        }
    }
}

/// What to download where
#[derive(Debug, Clone)]
pub struct DownloadParameters {
    pub download_to: PathBuf,
    pub mode: DownloadMode,
    /// Overwrite existing files and clean non-empty directories
    pub force: bool,
    /// Ids of optional mods to include
    pub optional_mods: BTreeSet<String>,
    /// Skip mods meant for the other side; `None` keeps both
    pub download_for: Option<ModSide>,
}

impl DownloadParameters {
    pub fn new<P: Into<PathBuf>>(download_to: P) -> Self {
        Self {
            download_to: download_to.into(),
            mode: DownloadMode::default(),
            force: false,
            optional_mods: BTreeSet::new(),
            download_for: None,
        }
    }

    pub fn with_mode(mut self, mode: DownloadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_optional_mods<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_mods = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_download_for(mut self, side: ModSide) -> Self {
        self.download_for = Some(side);
        self
    }
}

/// Manifest changes made by a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub downloaded: Vec<DownloadedMod>,
    pub removed: Vec<DownloadedMod>,
    pub kept: Vec<DownloadedMod>,
}

pub struct Downloader {
    http: HttpClient,
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let http = HttpClient::from_config(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub async fn run(
        &self,
        mods_config: &ModsConfig,
        params: &DownloadParameters,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult> {
        let dir = params.download_to.as_path();
        sink.line(&format!("config: {}", describe_config(mods_config)));
        sink.line(&format!("downloadTo: {}", dir.display()));
        sink.line(&format!("mode: {}", params.mode));
        info!("Starting {} into {}", params.mode, dir.display());

        let previous = prepare_directory(dir, params, sink).await?;

        let wanted = filter_mods(&mods_config.mods, &params.optional_mods, params.download_for)?;
        let diff = compute_mod_diff(&wanted, &previous);
        sink.line(&format!("mods to be downloaded: {} mod(s)", diff.updated.len()));
        sink.line(&format!("mods to be removed: {} mod(s)", diff.removed.len()));
        sink.line(&format!("mods to be keep: {} mod(s)", diff.keep.len()));

        for removed in &diff.removed {
            debug!("Removing {} version {}", removed.id, removed.version_id);
            delete_files(dir, &removed.files).await?;
        }

        let ctx = FetchContext {
            http: &self.http,
            config: &self.config,
            progress: sink,
        };
        let total = diff.updated.len();
        let completed = AtomicUsize::new(0);
        let results = join_all(
            diff.updated
                .iter()
                .map(|entry| download_mod(entry, &ctx, params, &completed, total)),
        )
        .await;

        let mut downloaded = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (entry, result) in diff.updated.iter().zip(results) {
            match result {
                Ok(downloaded_mod) => downloaded.push(downloaded_mod),
                Err(e) => {
                    warn!("Failed to download {} ({}): {}", entry.id, e.category(), e);
                    failures.push((entry.id.clone(), e));
                }
            }
        }

        let recorded: Vec<DownloadedMod> = downloaded.iter().chain(&diff.keep).cloned().collect();
        if let Err(source) = manifest::save_manifest(dir, &recorded).await {
            return Err(DownloadError::ManifestWrite {
                path: manifest::manifest_path(dir),
                source,
                pending: failures.into_iter().next().map(|(_, e)| Box::new(e)),
            });
        }

        let failed = failures.len();
        if let Some((id, first)) = failures.into_iter().next() {
            return Err(DownloadError::ModsFailed {
                id,
                failed,
                total,
                source: Box::new(first),
            });
        }

        info!(
            "Run finished: {} downloaded, {} removed, {} kept",
            downloaded.len(),
            diff.removed.len(),
            diff.keep.len()
        );
        Ok(RunResult {
            downloaded,
            removed: diff.removed,
            kept: diff.keep,
        })
    }
}

fn describe_config(config: &ModsConfig) -> String {
    match config.version {
        Some(version) => format!("{} mod(s) for mod-downloader {}", config.mods.len(), version),
        None => format!("{} mod(s)", config.mods.len()),
    }
}

/// Make sure `dir` is usable for `params.mode` and return the still-valid manifest
async fn prepare_directory(
    dir: &Path,
    params: &DownloadParameters,
    sink: &dyn ProgressSink,
) -> Result<Vec<DownloadedMod>> {
    match fs::metadata(dir).await {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(DownloadError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(_) => fs::create_dir_all(dir)
            .await
            .map_err(|e| DownloadError::file_system(dir, FileOperation::CreateDir, e))?,
    }

    let previous = match params.mode {
        DownloadMode::Clean => {
            if !is_dir_empty(dir).await? {
                if !params.force {
                    return Err(DownloadError::DirectoryNotEmpty {
                        path: dir.to_path_buf(),
                    });
                }
                info!("Cleaning {}", dir.display());
                clear_directory(dir).await?;
            }
            Vec::new()
        }
        DownloadMode::Incremental => {
            let recorded = manifest::read_manifest(dir).await?;
            manifest::retain_present(dir, recorded, |missing| {
                sink.line(&format!(
                    "WARNING: {}({} version {}) not found in directory.",
                    missing.files.join(", "),
                    missing.id,
                    missing.version_id
                ))
            })
            .await
        }
    };

    sink.line("downloaded mods:");
    for downloaded in &previous {
        sink.line(&format!("  {}", downloaded));
    }
    Ok(previous)
}

/// Fetch one mod and report its completion whether it succeeded or not
async fn download_mod(
    entry: &ModEntry,
    ctx: &FetchContext<'_>,
    params: &DownloadParameters,
    completed: &AtomicUsize,
    total: usize,
) -> Result<DownloadedMod> {
    ctx.progress.line(&format!(
        "downloading {} version {}",
        entry.id,
        entry.display_version()
    ));

    let result = fetch_and_write(entry, ctx, &params.download_to, params.force).await;

    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
    ctx.progress.line(&format!(
        "download complete: {} / {}: {} version {}",
        done,
        total,
        entry.id,
        entry.display_version()
    ));
    result
}

async fn fetch_and_write(
    entry: &ModEntry,
    ctx: &FetchContext<'_>,
    dir: &Path,
    force: bool,
) -> Result<DownloadedMod> {
    debug!("Resolving {} from {}", entry.id, entry.source.description());
    let fetched = entry.source.resolve(entry, ctx).await?;

    let mut written = Vec::with_capacity(fetched.len());
    for file in fetched {
        let path = file.path.clone();
        if let Err(e) = files::write_output(dir, file, force).await {
            remove_written(dir, &written).await;
            return Err(e);
        }
        written.push(path);
    }

    Ok(DownloadedMod::new(entry.id.clone(), entry.version_id.clone(), written))
}
