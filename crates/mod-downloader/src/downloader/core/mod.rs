//! Core types used throughout the downloader
//!
//! Errors, progress sinks, the HTTP client and file helpers. Everything
//! else in `downloader` builds on these.

pub mod error;
pub mod filename;
pub mod files;
pub mod http;
pub mod progress;

pub use error::{DownloadError, ErrorKind, FileOperation, Result};
pub use files::{FetchedFile, FileBody};
pub use http::HttpClient;
pub use progress::{NullProgressSink, ProgressSink, SharedProgressSink, TracingProgressSink};
