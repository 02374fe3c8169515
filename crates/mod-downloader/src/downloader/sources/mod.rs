//! Download source implementations
//!
//! Each source type is defined in its own file along with its fetch
//! protocol. [`DownloadSource`] is the closed set of them; dispatch goes
//! through [`DownloadSource::resolve`].

use futures::FutureExt;
use futures::future::BoxFuture;
use url::Url;

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{DownloadError, FetchedFile, HttpClient, ProgressSink, Result};
use crate::mods_config::ModEntry;

pub mod archive;
pub mod curse;
pub mod direct;
pub mod drive;
pub mod optifine;

pub use archive::ZipSource;
pub use curse::CurseSource;
pub use direct::UrlSource;
pub use drive::DriveSource;
pub use optifine::OptifineSource;

/// Where a mod's files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// Direct download from a URL pattern
    Url(UrlSource),
    /// CurseForge project resolved through cfwidget
    Curse(CurseSource),
    /// OptiFine download page
    Optifine(OptifineSource),
    /// Google Drive share link
    Drive(DriveSource),
    /// Entries unpacked from a zip produced by another source
    Zip(ZipSource),
}

/// Capabilities shared by every fetch task of a run
pub struct FetchContext<'a> {
    pub http: &'a HttpClient,
    pub config: &'a DownloadConfig,
    pub progress: &'a dyn ProgressSink,
}

impl DownloadSource {
    /// Get a human-readable description of this download source
    pub fn description(&self) -> String {
        match self {
            DownloadSource::Url(url) => format!("url {}", url.pattern),
            DownloadSource::Curse(curse) => match &curse.file_name {
                Some(file_name) => format!("curse {} (filename {})", curse.slug, file_name),
                None => format!("curse {}", curse.slug),
            },
            DownloadSource::Optifine(_) => "optifine".to_string(),
            DownloadSource::Drive(drive) => format!("drive {}", drive.file_id),
            DownloadSource::Zip(zip) => {
                format!(
                    "zip of '{}' into '{}' from {}",
                    zip.path_in_zip,
                    zip.dest_path,
                    zip.inner.description()
                )
            }
        }
    }

    /// Fetch the files this source produces for `entry`
    ///
    /// Boxed because [`ZipSource`] resolves its inner source recursively.
    pub fn resolve<'a>(
        &'a self,
        entry: &'a ModEntry,
        ctx: &'a FetchContext<'a>,
    ) -> BoxFuture<'a, Result<Vec<FetchedFile>>> {
        match self {
            DownloadSource::Url(source) => source.resolve(entry, ctx).boxed(),
            DownloadSource::Curse(source) => source.resolve(entry, ctx).boxed(),
            DownloadSource::Optifine(source) => source.resolve(entry, ctx).boxed(),
            DownloadSource::Drive(source) => source.resolve(entry, ctx).boxed(),
            DownloadSource::Zip(source) => source.resolve(entry, ctx).boxed(),
        }
    }
}

/// `base` with `segments` appended to its path, each percent-encoded
pub(crate) fn join_segments<I, S>(base: &str, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = DownloadError::parse_url(base)?;
    url.path_segments_mut()
        .map_err(|_| DownloadError::Configuration {
            message: format!("'{base}' can not be used as a base URL"),
            field: None,
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
