//! Browser session manager.
//!
//! Owns the one browser and browsing context used for a run. Startup is
//! expensive, so the context is created once and shared by every page fetch;
//! teardown attempts every release step regardless of earlier failures.
//! The session is single-caller: steps run sequentially.

use super::{Launcher, RenderPage, Renderer};
use crate::acquisition::{join_url, RenderedSource};
use crate::config::NavigationTimeouts;
use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SELECTOR_POLL: Duration = Duration::from_millis(100);

pub struct BrowserSession {
    launcher: Arc<dyn Launcher>,
    base_url: String,
    timeouts: NavigationTimeouts,
    renderer: Mutex<Option<Box<dyn Renderer>>>,
}

impl BrowserSession {
    pub fn new(launcher: Arc<dyn Launcher>, base_url: &str, timeouts: NavigationTimeouts) -> Self {
        Self {
            launcher,
            base_url: base_url.to_string(),
            timeouts,
            renderer: Mutex::new(None),
        }
    }

    /// Acquire the browser and its context. A no-op when already initialized.
    pub async fn initialize(&self) -> IngestResult<()> {
        let mut renderer = self.renderer.lock().await;
        if renderer.is_some() {
            return Ok(());
        }
        *renderer = Some(self.launcher.launch().await?);
        info!(base_url = %self.base_url, "browser session initialized");
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.renderer.lock().await.is_some()
    }

    /// Open an isolated page, initializing the session first if needed.
    pub async fn new_page(&self) -> IngestResult<Box<dyn RenderPage>> {
        self.initialize().await?;
        let renderer = self.renderer.lock().await;
        match renderer.as_ref() {
            Some(renderer) => renderer.new_page().await,
            None => Err(IngestError::Browser("session closed".to_string())),
        }
    }

    /// Load `base_url + path` into `page`.
    ///
    /// Fails only when the content-loaded signal is not reached within the
    /// navigation timeout. A missing `wait_selector` is logged and ignored.
    pub async fn navigate(
        &self,
        page: &dyn RenderPage,
        path: &str,
        wait_selector: Option<&str>,
    ) -> bool {
        let url = join_url(&self.base_url, path);
        match tokio::time::timeout(self.timeouts.navigation(), page.goto(&url)).await {
            Ok(Ok(())) => debug!(%url, "content loaded"),
            Ok(Err(e)) => {
                warn!(%url, error = %e, "navigation failed");
                return false;
            }
            Err(_) => {
                warn!(
                    %url,
                    timeout_ms = self.timeouts.navigation_ms,
                    "navigation timed out"
                );
                return false;
            }
        }

        tokio::time::sleep(self.timeouts.settle()).await;

        if let Some(selector) = wait_selector {
            if !self.wait_for_selector(page, selector).await {
                warn!(
                    %url,
                    selector,
                    timeout_ms = self.timeouts.selector_ms,
                    "selector not found, continuing"
                );
            }
        }
        true
    }

    async fn wait_for_selector(&self, page: &dyn RenderPage, selector: &str) -> bool {
        let probe = async {
            loop {
                match page.has_selector(selector).await {
                    Ok(true) => return true,
                    Ok(false) => {}
                    Err(e) => debug!(selector, error = %e, "selector probe failed"),
                }
                tokio::time::sleep(SELECTOR_POLL).await;
            }
        };
        tokio::time::timeout(self.timeouts.selector(), probe)
            .await
            .unwrap_or(false)
    }

    /// Release the context, then the browser, then the driver.
    pub async fn close(&self) {
        let Some(renderer) = self.renderer.lock().await.take() else {
            return;
        };
        if let Err(e) = renderer.close_context().await {
            warn!(error = %e, "failed to release browsing context");
        }
        if let Err(e) = renderer.close_browser().await {
            warn!(error = %e, "failed to close browser");
        }
        if let Err(e) = renderer.stop_driver().await {
            warn!(error = %e, "failed to stop browser driver");
        }
        info!("browser session closed");
    }
}

#[async_trait]
impl RenderedSource for BrowserSession {
    async fn fetch_rendered(&self, path: &str, wait_selector: Option<&str>) -> Option<String> {
        let page = match self.new_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(path, error = %e, "could not open page");
                return None;
            }
        };

        let html = if self.navigate(page.as_ref(), path, wait_selector).await {
            match page.html().await {
                Ok(html) => Some(html),
                Err(e) => {
                    warn!(path, error = %e, "could not read rendered HTML");
                    None
                }
            }
        } else {
            None
        };

        if let Err(e) = page.close().await {
            debug!(path, error = %e, "page close failed");
        }
        html
    }
}
