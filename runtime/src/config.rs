//! Runtime configuration.
//!
//! Defaults are overridden by `BAZAAR_*` environment variables, then by CLI
//! flags in `main`.

use crate::error::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_WIKI_URL: &str = "https://thebazaar.wiki.gg/wiki/";
pub const DEFAULT_RENDER_URL: &str = "https://www.howbazaar.gg";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_DB_PATH: &str = "bazaar.db";

const DEFAULT_NAV_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_SELECTOR_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SETTLE_MS: u64 = 2_000;
const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

/// Desktop Chrome identity shared by the HTTP fetcher and the browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/131.0.0.0 Safari/537.36";

/// Browser viewport used for rendered pages.
pub const VIEWPORT: (u32, u32) = (1280, 720);

/// Timeouts for one browser navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTimeouts {
    /// Hard limit on reaching the content-loaded signal.
    pub navigation_ms: u64,
    /// Fixed delay after content load, for client-side rendering to finish.
    pub settle_ms: u64,
    /// Soft limit on the optional selector wait.
    pub selector_ms: u64,
}

impl NavigationTimeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn selector(&self) -> Duration {
        Duration::from_millis(self.selector_ms)
    }
}

impl Default for NavigationTimeouts {
    fn default() -> Self {
        Self {
            navigation_ms: DEFAULT_NAV_TIMEOUT_MS,
            settle_ms: DEFAULT_SETTLE_MS,
            selector_ms: DEFAULT_SELECTOR_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the static reference wiki.
    pub wiki_url: String,
    /// Base URL of the browser-rendered companion site.
    pub render_url: String,
    /// Directory holding the JSON checkpoint artifacts.
    pub output_dir: PathBuf,
    /// SQLite database file.
    pub db_path: PathBuf,
    pub http_timeout_ms: u64,
    pub timeouts: NavigationTimeouts,
    pub headless: bool,
    /// Explicit Chromium binary; discovered on PATH when unset.
    pub chromium_path: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            wiki_url: DEFAULT_WIKI_URL.to_string(),
            render_url: DEFAULT_RENDER_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            timeouts: NavigationTimeouts::default(),
            headless: true,
            chromium_path: None,
        }
    }
}

impl IngestConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            wiki_url: read_env_string("BAZAAR_WIKI_URL").unwrap_or(defaults.wiki_url),
            render_url: read_env_string("BAZAAR_RENDER_URL").unwrap_or(defaults.render_url),
            output_dir: read_env_string("BAZAAR_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            db_path: read_env_string("BAZAAR_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            http_timeout_ms: read_env_u64("BAZAAR_HTTP_TIMEOUT_MS", defaults.http_timeout_ms),
            timeouts: NavigationTimeouts {
                navigation_ms: read_env_u64(
                    "BAZAAR_NAV_TIMEOUT_MS",
                    defaults.timeouts.navigation_ms,
                ),
                settle_ms: read_env_u64("BAZAAR_SETTLE_MS", defaults.timeouts.settle_ms),
                selector_ms: read_env_u64(
                    "BAZAAR_SELECTOR_TIMEOUT_MS",
                    defaults.timeouts.selector_ms,
                ),
            },
            headless: read_env_bool("BAZAAR_HEADLESS", defaults.headless),
            chromium_path: read_env_string("BAZAAR_CHROMIUM_PATH").map(PathBuf::from),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Reject base URLs that are not absolute http(s) URLs.
    pub fn validate(&self) -> IngestResult<()> {
        for (name, raw) in [("wiki_url", &self.wiki_url), ("render_url", &self.render_url)] {
            let parsed = Url::parse(raw)
                .map_err(|e| IngestError::Config(format!("{name} {raw:?} is not a URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(IngestError::Config(format!(
                    "{name} must be http or https, got {}",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }
}

fn read_env_u64(name: &str, default_value: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default_value)
}

fn read_env_bool(name: &str, default_value: bool) -> bool {
    match read_env_string(name).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default_value,
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
