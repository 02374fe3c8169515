//! Progress reporting for download runs
//!
//! Progress is a stream of human readable lines. Sinks are shared by every
//! concurrent fetch task of a run, so they must be `Send + Sync`.

use std::sync::Arc;
use tracing::info;

/// Receives one progress line at a time
pub trait ProgressSink: Send + Sync {
    fn line(&self, line: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn line(&self, line: &str) {
        self(line)
    }
}

/// Shared handle passed to fetch tasks
pub type SharedProgressSink = Arc<dyn ProgressSink>;

/// Forwards progress lines to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn line(&self, line: &str) {
        info!(target: "mod_downloader::progress", "{}", line);
    }
}

/// Discards all progress lines
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn line(&self, _line: &str) {}
}
