//! Chromium-backed renderer using chromiumoxide.

use super::{Launcher, RenderPage, Renderer};
use crate::config::{IngestConfig, USER_AGENT, VIEWPORT};
use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Interval between `document.readyState` probes while waiting for content.
const READY_POLL: Duration = Duration::from_millis(50);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. BAZAAR_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("BAZAAR_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches a local Chromium with one browsing context.
pub struct ChromiumLauncher {
    chrome_path: Option<PathBuf>,
    headless: bool,
}

impl ChromiumLauncher {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            chrome_path: config.chromium_path.clone(),
            headless: config.headless,
        }
    }

    fn browser_config(&self, chrome_path: PathBuf) -> IngestResult<BrowserConfig> {
        let (width, height) = VIEWPORT;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                ..Viewport::default()
            })
            .arg(format!("--user-agent={USER_AGENT}"))
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");

        builder = if self.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        builder
            .build()
            .map_err(|e| IngestError::Browser(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> IngestResult<Box<dyn Renderer>> {
        let chrome_path = self
            .chrome_path
            .clone()
            .filter(|p| p.exists())
            .or_else(find_chromium)
            .ok_or_else(|| {
                IngestError::Browser(
                    "Chromium not found. Install it or set BAZAAR_CHROMIUM_PATH.".to_string(),
                )
            })?;
        debug!(path = %chrome_path.display(), "launching Chromium");

        let config = self.browser_config(chrome_path)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| IngestError::Browser(format!("failed to launch Chromium: {e}")))?;

        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        let context = match browser.execute(CreateBrowserContextParams::default()).await {
            Ok(resp) => resp.result.browser_context_id,
            Err(e) => {
                driver.abort();
                return Err(IngestError::Browser(format!(
                    "failed to create browsing context: {e}"
                )));
            }
        };
        info!("Chromium session ready");

        Ok(Box::new(ChromiumRenderer {
            browser: Mutex::new(Some(browser)),
            context: Mutex::new(Some(context)),
            driver: Mutex::new(Some(driver)),
        }))
    }
}

/// A running Chromium instance.
pub struct ChromiumRenderer {
    browser: Mutex<Option<Browser>>,
    context: Mutex<Option<BrowserContextId>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_page(&self) -> IngestResult<Box<dyn RenderPage>> {
        let mut params = CreateTargetParams::new("about:blank");
        params.browser_context_id = self.context.lock().await.clone();

        let browser = self.browser.lock().await;
        let browser = browser
            .as_ref()
            .ok_or_else(|| IngestError::Browser("browser already closed".to_string()))?;

        let page = browser
            .new_page(params)
            .await
            .map_err(|e| IngestError::Browser(format!("failed to create page: {e}")))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close_context(&self) -> IngestResult<()> {
        let Some(id) = self.context.lock().await.take() else {
            return Ok(());
        };
        let browser = self.browser.lock().await;
        if let Some(browser) = browser.as_ref() {
            browser
                .execute(DisposeBrowserContextParams::new(id))
                .await
                .map_err(|e| IngestError::Browser(format!("failed to dispose context: {e}")))?;
        }
        Ok(())
    }

    async fn close_browser(&self) -> IngestResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        browser
            .close()
            .await
            .map_err(|e| IngestError::Browser(format!("failed to close browser: {e}")))?;
        browser
            .wait()
            .await
            .map_err(|e| IngestError::Browser(format!("browser did not exit: {e}")))?;
        Ok(())
    }

    async fn stop_driver(&self) -> IngestResult<()> {
        if let Some(driver) = self.driver.lock().await.take() {
            driver.abort();
        }
        Ok(())
    }
}

/// A single Chromium page.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    async fn ready_state(&self) -> IngestResult<String> {
        self.page
            .evaluate("document.readyState")
            .await
            .map_err(|e| IngestError::Browser(format!("readyState probe failed: {e}")))?
            .into_value()
            .map_err(|e| IngestError::Browser(format!("readyState is not a string: {e:?}")))
    }
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn goto(&self, url: &str) -> IngestResult<()> {
        let resp = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| IngestError::navigation(url, e))?;
        if let Some(error_text) = &resp.result.error_text {
            return Err(IngestError::navigation(url, error_text));
        }

        // Committed; now wait for DOMContentLoaded without waiting on the
        // long-lived connections the page keeps open.
        loop {
            match self.ready_state().await {
                Ok(state) if state == "interactive" || state == "complete" => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!(%url, error = %e, "document not ready yet"),
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    async fn has_selector(&self, selector: &str) -> IngestResult<bool> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| IngestError::Browser(format!("bad selector: {e}")))?;
        self.page
            .evaluate(format!("document.querySelector({quoted}) !== null"))
            .await
            .map_err(|e| IngestError::Browser(format!("selector probe failed: {e}")))?
            .into_value()
            .map_err(|e| IngestError::Browser(format!("selector probe result: {e:?}")))
    }

    async fn html(&self) -> IngestResult<String> {
        self.page
            .evaluate("document.documentElement.outerHTML")
            .await
            .map_err(|e| IngestError::Browser(format!("failed to get HTML: {e}")))?
            .into_value()
            .map_err(|e| IngestError::Browser(format!("failed to convert HTML result: {e:?}")))
    }

    async fn close(self: Box<Self>) -> IngestResult<()> {
        self.page
            .close()
            .await
            .map_err(|e| IngestError::Browser(format!("failed to close page: {e}")))
    }
}
