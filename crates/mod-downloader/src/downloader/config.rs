//! Configuration types for the downloader

use std::time::Duration;

use crate::downloader::core::{DownloadError, Result};

const ENV_PREFIX: &str = "MOD_DOWNLOADER_";

/// Configuration for download runs
///
/// Service endpoints are configurable so tests can point them at a mock
/// server.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Timeout for every single HTTP request
    pub timeout: Duration,
    pub user_agent: String,
    /// Delay between cfwidget polls while a project is still being indexed
    pub curse_poll_interval: Duration,
    pub cfwidget_url: String,
    pub forge_cdn_url: String,
    pub optifine_url: String,
    pub drive_url: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: format!("mod-downloader/{}", env!("CARGO_PKG_VERSION")),
            curse_poll_interval: Duration::from_secs(10),
            cfwidget_url: "https://api.cfwidget.com/".to_string(),
            forge_cdn_url: "https://edge.forgecdn.net/files/".to_string(),
            optifine_url: "https://optifine.net/adloadx".to_string(),
            drive_url: "https://drive.google.com/uc".to_string(),
        }
    }
}

impl DownloadConfig {
    /// Defaults overridden by `MOD_DOWNLOADER_*` variables, reading `.env` if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(secs) = var("TIMEOUT_SECS") {
            config.timeout = parse_secs("TIMEOUT_SECS", &secs)?;
        }
        if let Some(user_agent) = var("USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(secs) = var("CURSE_POLL_SECS") {
            config.curse_poll_interval = parse_secs("CURSE_POLL_SECS", &secs)?;
        }
        if let Some(url) = var("CFWIDGET_URL") {
            config.cfwidget_url = url;
        }
        if let Some(url) = var("FORGE_CDN_URL") {
            config.forge_cdn_url = url;
        }
        if let Some(url) = var("OPTIFINE_URL") {
            config.optifine_url = url;
        }
        if let Some(url) = var("DRIVE_URL") {
            config.drive_url = url;
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_curse_poll_interval(mut self, interval: Duration) -> Self {
        self.curse_poll_interval = interval;
        self
    }

    pub fn with_cfwidget_url<S: Into<String>>(mut self, url: S) -> Self {
        self.cfwidget_url = url.into();
        self
    }

    pub fn with_forge_cdn_url<S: Into<String>>(mut self, url: S) -> Self {
        self.forge_cdn_url = url.into();
        self
    }

    pub fn with_optifine_url<S: Into<String>>(mut self, url: S) -> Self {
        self.optifine_url = url.into();
        self
    }

    pub fn with_drive_url<S: Into<String>>(mut self, url: S) -> Self {
        self.drive_url = url.into();
        self
    }
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| DownloadError::Configuration {
            message: format!("{ENV_PREFIX}{name} must be a whole number of seconds, got '{value}'"),
            field: Some(name.to_lowercase()),
        })
}
