//! Output file naming from `Content-Disposition` and request URLs

use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use url::Url;

use super::{DownloadError, Result};

/// Pick the output file name for a download
///
/// Order: `filename*` (RFC 5987), then `filename`, then the last path
/// segment of `url`, percent-decoded. The result must be a plain file name.
pub fn resolve_file_name(headers: &HeaderMap, url: &Url) -> Result<String> {
    let disposition = headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .map(DispositionParams::parse)
        .unwrap_or_default();

    let name = disposition
        .extended_file_name
        .as_deref()
        .and_then(decode_rfc5987)
        .or(disposition.file_name)
        .unwrap_or_else(|| last_segment(url));

    validate_file_name(&name)?;
    Ok(name)
}

/// Reject names that are not a single path component
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(DownloadError::InvalidFileName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn last_segment(url: &Url) -> String {
    let encoded = url.path().rsplit('/').next().unwrap_or_default();
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

#[derive(Debug, Default)]
struct DispositionParams {
    file_name: Option<String>,
    extended_file_name: Option<String>,
}

impl DispositionParams {
    /// Parse the parameters of a `Content-Disposition` value
    ///
    /// The disposition type is ignored. Quoted values may contain `;` and
    /// backslash escapes.
    fn parse(value: &str) -> Self {
        let mut params = Self::default();
        let mut rest = match value.split_once(';') {
            Some((_, rest)) => rest,
            None => return params,
        };

        loop {
            rest = rest.trim_start_matches([' ', '\t', ';']);
            if rest.is_empty() {
                break;
            }
            let Some((name, after_eq)) = rest.split_once('=') else {
                break;
            };
            let name = name.trim().to_ascii_lowercase();
            let after_eq = after_eq.trim_start();

            let (value, remainder) = if let Some(quoted) = after_eq.strip_prefix('"') {
                read_quoted(quoted)
            } else {
                match after_eq.split_once(';') {
                    Some((value, remainder)) => (value.trim().to_string(), remainder),
                    None => (after_eq.trim().to_string(), ""),
                }
            };

            match name.as_str() {
                "filename" => params.file_name = Some(value),
                "filename*" => params.extended_file_name = Some(value),
                _ => {}
            }
            rest = remainder;
        }
        params
    }
}

/// Read a quoted-string body; returns the unescaped value and what follows the closing quote
fn read_quoted(text: &str) -> (String, &str) {
    let mut value = String::new();
    let mut chars = text.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            '"' => return (value, &text[index + 1..]),
            _ => value.push(c),
        }
    }
    (value, "")
}

/// Decode an RFC 5987 `charset'language'value` extended value
///
/// Returns `None` for malformed input and unsupported charsets so the
/// caller falls back to the plain parameter.
pub fn decode_rfc5987(text: &str) -> Option<String> {
    let mut parts = text.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;

    let bytes: Vec<u8> = percent_decode_str(encoded).collect();
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8(bytes).ok(),
        "iso-8859-1" | "latin1" | "iso_8859-1" => Some(bytes.into_iter().map(char::from).collect()),
        "us-ascii" | "ascii" => bytes.is_ascii().then(|| bytes.into_iter().map(char::from).collect()),
        _ => None,
    }
}
