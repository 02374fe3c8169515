//! Direct URL download source

use reqwest::header::HeaderMap;
use url::Url;

use super::FetchContext;
use crate::downloader::core::filename::resolve_file_name;
use crate::downloader::core::{DownloadError, FetchedFile, FileBody, HttpClient, Result};
use crate::mods_config::ModEntry;

const VERSION_PLACEHOLDER: &str = "$version";

/// Download from a URL pattern; `$version` is replaced by the entry's version id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSource {
    pub pattern: String,
}

impl UrlSource {
    pub fn new<S: Into<String>>(pattern: S) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn url_for(&self, version_id: &str) -> String {
        self.pattern.replace(VERSION_PLACEHOLDER, version_id)
    }

    pub async fn resolve(&self, entry: &ModEntry, ctx: &FetchContext<'_>) -> Result<Vec<FetchedFile>> {
        let url = DownloadError::parse_url(&self.url_for(&entry.version_id))?;
        ctx.progress
            .line(&format!("fetching download url for {}: {}", entry.id, url));
        Ok(vec![fetch_named(ctx.http, &url).await?])
    }
}

/// GET `url` and name the file from its response headers or URL
pub(crate) async fn fetch_named(http: &HttpClient, url: &Url) -> Result<FetchedFile> {
    let response = http.get_success(url, HeaderMap::new()).await?;
    let name = resolve_file_name(response.headers(), url)?;
    Ok(FetchedFile::new(name, FileBody::Response(response)))
}
