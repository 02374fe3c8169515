//! CurseForge download source
//!
//! The project is looked up on cfwidget by slug. cfwidget answers
//! `{"error": "in_queue"}` while it is still indexing a project it has not
//! seen before; that state is polled until the project is ready.

use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use super::{FetchContext, join_segments};
use crate::downloader::core::filename::validate_file_name;
use crate::downloader::core::{DownloadError, FetchedFile, FileBody, Result};
use crate::mods_config::ModEntry;

const IN_QUEUE: &str = "in_queue";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurseSource {
    pub slug: String,
    /// Used when cfwidget does not list the requested file
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CfWidgetResponse {
    id: Option<u64>,
    error: Option<String>,
    #[serde(default)]
    files: Vec<CfWidgetFile>,
}

#[derive(Debug, Deserialize)]
struct CfWidgetFile {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

impl CurseSource {
    pub fn new<S: Into<String>>(slug: S) -> Self {
        Self {
            slug: slug.into(),
            file_name: None,
        }
    }

    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub async fn resolve(&self, entry: &ModEntry, ctx: &FetchContext<'_>) -> Result<Vec<FetchedFile>> {
        let file_id: u64 = entry
            .version_id
            .parse()
            .map_err(|_| DownloadError::Configuration {
                message: format!(
                    "version of curse mod '{}' must be a numeric file id, got '{}'",
                    entry.id, entry.version_id
                ),
                field: Some("version".to_string()),
            })?;

        let widget = self.fetch_widget(entry, ctx).await?;
        let file_name = self.pick_file_name(&widget, file_id, &entry.version_id)?;
        validate_file_name(&file_name)?;

        let mut segments = cdn_segments(file_id);
        segments.push(file_name.clone());
        let url = join_segments(&ctx.config.forge_cdn_url, &segments)?;

        ctx.progress
            .line(&format!("fetching download url for {}: {}", entry.id, url));
        let response = ctx.http.get_success(&url, HeaderMap::new()).await?;
        Ok(vec![FetchedFile::new(file_name, FileBody::Response(response))])
    }

    async fn fetch_widget(&self, entry: &ModEntry, ctx: &FetchContext<'_>) -> Result<CfWidgetResponse> {
        let url = join_segments(&ctx.config.cfwidget_url, ["minecraft", "mc-mods", self.slug.as_str()])?;

        loop {
            ctx.progress.line(&format!(
                "fetching project id and file info from cfwidget for {}",
                entry.id
            ));
            // cfwidget reports "in_queue" with a non-2xx status, so the body is decoded regardless
            let response = ctx.http.get(&url, HeaderMap::new()).await?;
            let body = response
                .text()
                .await
                .map_err(|e| ctx.http.request_error(&url, e))?;
            let widget: CfWidgetResponse =
                serde_json::from_str(&body).map_err(|source| DownloadError::MalformedPayload {
                    url: url.to_string(),
                    source,
                })?;

            if widget.id.is_some() {
                return Ok(widget);
            }
            match widget.error.as_deref() {
                Some(IN_QUEUE) => {
                    debug!(
                        "cfwidget is indexing {}, retrying in {:?}",
                        self.slug, ctx.config.curse_poll_interval
                    );
                    tokio::time::sleep(ctx.config.curse_poll_interval).await;
                }
                other => {
                    return Err(DownloadError::unexpected_response(
                        url.as_str(),
                        format!(
                            "unknown response from cfwidget: {}",
                            other.unwrap_or("no project id")
                        ),
                    ));
                }
            }
        }
    }

    fn pick_file_name(&self, widget: &CfWidgetResponse, file_id: u64, version_id: &str) -> Result<String> {
        widget
            .files
            .iter()
            .find(|file| file.id == file_id)
            .and_then(|file| file.name.clone())
            .or_else(|| self.file_name.clone())
            .ok_or_else(|| DownloadError::CurseVersionNotFound {
                slug: self.slug.clone(),
                version_id: version_id.to_string(),
            })
    }
}

/// Path segments of a file id on the forge CDN
///
/// Digits are grouped by four from the left; groups after the first lose
/// their leading zeros (`3522183` is `3522/183`, `2916002` is `2916/2`).
fn cdn_segments(file_id: u64) -> Vec<String> {
    let digits = file_id.to_string();
    digits
        .as_bytes()
        .chunks(4)
        .enumerate()
        .map(|(index, chunk)| {
            let group = String::from_utf8_lossy(chunk);
            if index == 0 {
                return group.into_owned();
            }
            match group.trim_start_matches('0') {
                "" => "0".to_string(),
                trimmed => trimmed.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdn_segments() {
        assert_eq!(cdn_segments(3522183), vec!["3522", "183"]);
        assert_eq!(cdn_segments(2916002), vec!["2916", "2"]);
        assert_eq!(cdn_segments(4650000), vec!["4650", "0"]);
        assert_eq!(cdn_segments(123), vec!["123"]);
        assert_eq!(cdn_segments(123456789), vec!["1234", "5678", "9"]);
    }

    #[test]
    fn test_pick_file_name() {
        let widget: CfWidgetResponse = serde_json::from_str(
            r#"{"id": 1, "files": [{"id": 10, "name": "a-1.0.jar"}, {"id": 11}]}"#,
        )
        .unwrap();

        let source = CurseSource::new("a");
        assert_eq!(source.pick_file_name(&widget, 10, "10").unwrap(), "a-1.0.jar");
        assert!(matches!(
            source.pick_file_name(&widget, 12, "12"),
            Err(DownloadError::CurseVersionNotFound { .. })
        ));

        let source = source.with_file_name("override.jar");
        assert_eq!(source.pick_file_name(&widget, 10, "10").unwrap(), "a-1.0.jar");
        assert_eq!(source.pick_file_name(&widget, 11, "11").unwrap(), "override.jar");
        assert_eq!(source.pick_file_name(&widget, 12, "12").unwrap(), "override.jar");
    }
}
