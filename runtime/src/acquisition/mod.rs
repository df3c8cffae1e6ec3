//! Upstream page acquisition.
//!
//! Two fetch kinds feed the extractors: a static document fetched over plain
//! HTTP, and a browser-rendered document with an optional post-load selector
//! wait. Both degrade to `None` on failure; the reason is logged where it
//! happened.

pub mod http_client;

use async_trait::async_trait;

/// Static documents addressed by path relative to a base URL.
#[async_trait]
pub trait StaticSource: Send + Sync {
    async fn fetch_document(&self, path: &str) -> Option<String>;
}

/// Browser-rendered documents addressed by path relative to a base URL.
#[async_trait]
pub trait RenderedSource: Send + Sync {
    /// Navigate to `path`, optionally wait for `wait_selector`, and return the
    /// rendered HTML.
    async fn fetch_rendered(&self, path: &str, wait_selector: Option<&str>) -> Option<String>;
}

/// Join a base URL and a page path with exactly one separating slash.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://thebazaar.wiki.gg/wiki/", "Dooley_Items"),
            "https://thebazaar.wiki.gg/wiki/Dooley_Items"
        );
        assert_eq!(
            join_url("https://www.howbazaar.gg", "/monsters"),
            "https://www.howbazaar.gg/monsters"
        );
        assert_eq!(join_url("https://a.test/", ""), "https://a.test");
    }
}
