//! Error types for the downloader with context for user-facing reports

use std::path::PathBuf;
use thiserror::Error;

use crate::mods_config::ParseError;

/// Every failure the downloader can report
///
/// Variants split into two kinds, see [`DownloadError::kind`]: user errors
/// are actionable misconfiguration or remote-service failures, internal
/// errors are I/O faults and payloads of an unexpected shape.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Config file syntax or unsupported declared version
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("optional mod(s) not found: {}", ids.join(", "))]
    OptionalModsNotFound { ids: Vec<String> },

    /// Non-2xx response while downloading
    #[error("downloading '{url}' returned {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("file already exists: '{}' (run with force to overwrite)", path.display())]
    FileExists { path: PathBuf },

    #[error("directory '{}' is not empty; run with force to clean it up", path.display())]
    DirectoryNotEmpty { path: PathBuf },

    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// Resolved output name would escape its directory
    #[error("invalid file name: '{name}'")]
    InvalidFileName { name: String },

    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: url::ParseError,
    },

    #[error(
        "version {version_id} of '{slug}' was not found, ask the server administrator to set an explicit filename"
    )]
    CurseVersionNotFound { slug: String, version_id: String },

    /// Remote page or API answered with something we can not interpret
    #[error("unexpected response from '{url}': {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("zip source needs exactly one inner file but got {count}")]
    ZipSourceFileCount { count: usize },

    /// Aggregate failure of a run; the source is the first failed mod's error
    #[error("failed to download '{id}' ({failed} of {total} mod(s) failed)")]
    ModsFailed {
        id: String,
        failed: usize,
        total: usize,
        #[source]
        source: Box<DownloadError>,
    },

    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to '{url}' timed out after {duration_secs}s (try increasing timeout or check network)")]
    NetworkTimeout { url: String, duration_secs: u64 },

    #[error("{operation} '{}' failed", path.display())]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed payload from '{url}'")]
    MalformedPayload {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid content from '{url}': {message}")]
    InvalidContent { url: String, message: String },

    #[error("reading zip archive failed")]
    Archive {
        #[source]
        source: zip::result::ZipError,
    },

    /// Writing the manifest failed; `pending` holds the first fetch failure, if any
    #[error("writing manifest '{}' failed{}", path.display(), pending_suffix(pending))]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        pending: Option<Box<DownloadError>>,
    },

    #[error("background task for {operation} failed")]
    TaskFailed {
        operation: String,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

fn pending_suffix(pending: &Option<Box<DownloadError>>) -> String {
    match pending {
        Some(error) => format!(" (also failed to download: {error})"),
        None => String::new(),
    }
}

/// Who has to act on an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fixable by the user: config, flags, or the remote service
    User,
    Internal,
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    Delete,
    Metadata,
    CreateDir,
    ListDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Delete => write!(f, "deleting"),
            FileOperation::Metadata => write!(f, "reading metadata of"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::ListDir => write!(f, "listing directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

impl DownloadError {
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: FileOperation,
        source: std::io::Error,
    ) -> Self {
        DownloadError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }

    pub fn unexpected_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        DownloadError::UnexpectedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        DownloadError::InvalidUrl {
            url: url.into(),
            suggestion: url_suggestion(&source).to_string(),
            source,
        }
    }

    /// Parse `url`, keeping the offending text in the error
    pub fn parse_url(url: &str) -> Result<url::Url> {
        url::Url::parse(url).map_err(|source| DownloadError::invalid_url(url, source))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::Parse(_)
            | DownloadError::OptionalModsNotFound { .. }
            | DownloadError::HttpStatus { .. }
            | DownloadError::FileExists { .. }
            | DownloadError::DirectoryNotEmpty { .. }
            | DownloadError::NotADirectory { .. }
            | DownloadError::InvalidFileName { .. }
            | DownloadError::InvalidUrl { .. }
            | DownloadError::CurseVersionNotFound { .. }
            | DownloadError::UnexpectedResponse { .. }
            | DownloadError::ZipSourceFileCount { .. }
            | DownloadError::ModsFailed { .. }
            | DownloadError::Configuration { .. } => ErrorKind::User,
            DownloadError::HttpRequest { .. }
            | DownloadError::NetworkTimeout { .. }
            | DownloadError::FileSystem { .. }
            | DownloadError::MalformedPayload { .. }
            | DownloadError::InvalidContent { .. }
            | DownloadError::Archive { .. }
            | DownloadError::ManifestWrite { .. }
            | DownloadError::TaskFailed { .. } => ErrorKind::Internal,
        }
    }

    pub fn is_user_error(&self) -> bool {
        self.kind() == ErrorKind::User
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::Parse(_) => "parse",
            DownloadError::OptionalModsNotFound { .. } => "optional_mods_not_found",
            DownloadError::HttpStatus { .. } => "http_status",
            DownloadError::FileExists { .. } => "file_exists",
            DownloadError::DirectoryNotEmpty { .. } => "directory_not_empty",
            DownloadError::NotADirectory { .. } => "not_a_directory",
            DownloadError::InvalidFileName { .. } => "invalid_file_name",
            DownloadError::InvalidUrl { .. } => "invalid_url",
            DownloadError::CurseVersionNotFound { .. } => "curse_version_not_found",
            DownloadError::UnexpectedResponse { .. } => "unexpected_response",
            DownloadError::ZipSourceFileCount { .. } => "zip_source_file_count",
            DownloadError::ModsFailed { .. } => "mods_failed",
            DownloadError::HttpRequest { .. } => "http_request",
            DownloadError::NetworkTimeout { .. } => "network_timeout",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::MalformedPayload { .. } => "malformed_payload",
            DownloadError::InvalidContent { .. } => "invalid_content",
            DownloadError::Archive { .. } => "archive",
            DownloadError::ManifestWrite { .. } => "manifest_write",
            DownloadError::TaskFailed { .. } => "task_failed",
            DownloadError::Configuration { .. } => "configuration",
        }
    }
}

fn url_suggestion(error: &url::ParseError) -> &'static str {
    match error {
        url::ParseError::EmptyHost => "URL must have a valid hostname",
        url::ParseError::InvalidPort => "Port number must be between 1 and 65535",
        url::ParseError::RelativeUrlWithoutBase => {
            "URL must be absolute (include http:// or https://)"
        }
        _ => "Check URL format and try again",
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(error: reqwest::Error) -> Self {
        let url = error
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        DownloadError::HttpRequest { url, source: error }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(error: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: FileOperation::Read,
            source: error,
        }
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(error: url::ParseError) -> Self {
        DownloadError::InvalidUrl {
            url: "<unparseable>".to_string(),
            suggestion: url_suggestion(&error).to_string(),
            source: error,
        }
    }
}

impl From<zip::result::ZipError> for DownloadError {
    fn from(source: zip::result::ZipError) -> Self {
        DownloadError::Archive { source }
    }
}
