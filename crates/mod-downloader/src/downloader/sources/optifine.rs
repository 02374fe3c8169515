//! OptiFine download source
//!
//! optifine.net hands out downloads through an ad landing page. The real
//! link is the first anchor after the download button marker.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

use super::FetchContext;
use crate::downloader::core::filename::resolve_file_name;
use crate::downloader::core::{DownloadError, FetchedFile, FileBody, Result};
use crate::mods_config::ModEntry;

const DOWNLOAD_BUTTON_MARKER: &str = "class=\"downloadButton\"";
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

static ANCHOR_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<a [^>]*href=['"]([^'"]*)['"]"#).expect("valid anchor regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptifineSource;

impl OptifineSource {
    pub async fn resolve(&self, entry: &ModEntry, ctx: &FetchContext<'_>) -> Result<Vec<FetchedFile>> {
        let jar_name = format!("OptiFine_{}.jar", entry.version_id);
        let landing = Url::parse_with_params(&ctx.config.optifine_url, [("f", jar_name.as_str())])
            .map_err(|source| DownloadError::invalid_url(ctx.config.optifine_url.as_str(), source))?;

        ctx.progress
            .line(&format!("fetching download url for optifine {}", entry.version_id));
        let html = ctx.http.get_text(&landing).await?;
        let href = find_download_href(&html).map_err(|message| {
            DownloadError::unexpected_response(landing.as_str(), message)
        })?;
        let download = landing.join(href)?;
        debug!("OptiFine href {} resolved to {}", href, download);

        ctx.progress.line(&format!("downloading optifine: {}", download));
        let response = ctx.http.get_success(&download, HeaderMap::new()).await?;
        let name = resolve_file_name(response.headers(), &download)?;
        let bytes = FileBody::Response(response).into_bytes().await?;

        if !bytes.starts_with(&ZIP_MAGIC) {
            return Err(DownloadError::InvalidContent {
                url: download.to_string(),
                message: "response is not a jar file".to_string(),
            });
        }

        Ok(vec![FetchedFile::new(name, FileBody::Bytes(bytes))])
    }
}

/// Extract the href of the first anchor on a line after the download button marker
fn find_download_href(html: &str) -> std::result::Result<&str, String> {
    let anchor_line = html
        .lines()
        .skip_while(|line| !line.contains(DOWNLOAD_BUTTON_MARKER))
        .skip(1)
        .find(|line| line.contains("<a"))
        .ok_or_else(|| "no download button".to_string())?;

    ANCHOR_HREF
        .captures(anchor_line)
        .and_then(|captures| captures.get(1))
        .map(|href| href.as_str())
        .ok_or_else(|| format!("no a tag: {}", anchor_line.trim()))
}
