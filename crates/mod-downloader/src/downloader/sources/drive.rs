//! Google Drive download source
//!
//! Large or unscanned files are served behind one or more HTML
//! confirmation pages. Each page is answered by following its bypass link,
//! submitting its hidden download form, or reading the embedded download
//! URL, replaying the cookies collected so far. The file is named after the
//! URL it was finally served from.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Response;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::FetchContext;
use crate::downloader::core::filename::resolve_file_name;
use crate::downloader::core::{DownloadError, FetchedFile, FileBody, HttpClient, Result};
use crate::mods_config::ModEntry;

/// Upper bound on confirmation pages before giving up
const MAX_HOPS: usize = 10;

static DOWNLOAD_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a#uc-download-link").expect("valid selector"));
static DOWNLOAD_FORM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form#download-form").expect("valid selector"));
static HIDDEN_INPUT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[type="hidden"]"#).expect("valid selector"));
static DOWNLOAD_URL_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""downloadUrl"\s*:\s*("(?:[^"\\]|\\.)*")"#).expect("valid downloadUrl regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSource {
    pub file_id: String,
}

impl DriveSource {
    pub fn new<S: Into<String>>(file_id: S) -> Self {
        Self {
            file_id: file_id.into(),
        }
    }

    pub async fn resolve(&self, entry: &ModEntry, ctx: &FetchContext<'_>) -> Result<Vec<FetchedFile>> {
        let mut url = Url::parse_with_params(
            &ctx.config.drive_url,
            [("export", "download"), ("id", self.file_id.as_str())],
        )
        .map_err(|source| DownloadError::invalid_url(ctx.config.drive_url.as_str(), source))?;

        ctx.progress
            .line(&format!("fetching download url for {}: {}", entry.id, url));

        // Per-task session so cookies from every hop, redirects included, are replayed
        let http = HttpClient::with_cookies(ctx.config, Arc::new(Jar::default()))?;
        for hop in 0..MAX_HOPS {
            let response = http.get_success(&url, HeaderMap::new()).await?;
            let final_url = response.url().clone();
            if !is_html(&response) {
                let name = resolve_file_name(response.headers(), &final_url)?;
                debug!("Drive file {} reached after {} confirmation page(s)", self.file_id, hop);
                return Ok(vec![FetchedFile::new(name, FileBody::Response(response))]);
            }

            let html = response
                .text()
                .await
                .map_err(|e| http.request_error(&final_url, e))?;
            url = find_confirmation_url(&html, &final_url).ok_or_else(|| {
                DownloadError::unexpected_response(
                    final_url.as_str(),
                    "no download link, download form, or download url found in confirmation page",
                )
            })?;
            debug!("Drive confirmation hop {} -> {}", hop + 1, url);
        }

        Err(DownloadError::unexpected_response(
            url.as_str(),
            format!("still on a confirmation page after {MAX_HOPS} requests"),
        ))
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("text/html"))
}

/// Find where a confirmation page wants us to go next
///
/// Tried in order: the bypass anchor, the hidden download form with its
/// inputs as query parameters, and an embedded `"downloadUrl"` JSON field.
fn find_confirmation_url(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);

    if let Some(href) = document
        .select(&DOWNLOAD_LINK)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
    {
        return base.join(href).ok();
    }

    if let Some(form) = document.select(&DOWNLOAD_FORM).next() {
        if let Some(action) = form.value().attr("action") {
            let mut url = base.join(action).ok()?;
            let inputs: Vec<(&str, &str)> = form
                .select(&HIDDEN_INPUT)
                .filter_map(|input| {
                    let input = input.value();
                    Some((input.attr("name")?, input.attr("value").unwrap_or("")))
                })
                .collect();
            if !inputs.is_empty() {
                url.query_pairs_mut().extend_pairs(inputs);
            }
            return Some(url);
        }
    }

    let captures = DOWNLOAD_URL_FIELD.captures(html)?;
    let download_url: String = serde_json::from_str(captures.get(1)?.as_str()).ok()?;
    base.join(&download_url).ok()
}
