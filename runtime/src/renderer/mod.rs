//! Headless browser abstraction.
//!
//! `Launcher` acquires a browser, `Renderer` is the running browser with its
//! single browsing context, and `RenderPage` is one page inside that context.
//! The session manager in [`session`] is the only caller; everything above it
//! sees rendered documents through [`crate::acquisition::RenderedSource`].

pub mod chromium;
pub mod session;

use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;

/// Acquires a browser process and its browsing context.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> IngestResult<Box<dyn Renderer>>;
}

/// A running browser with one browsing context.
///
/// Teardown is split into three steps so the session can attempt each one
/// even when an earlier step fails.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh page inside the browsing context.
    async fn new_page(&self) -> IngestResult<Box<dyn RenderPage>>;
    /// Dispose of the browsing context.
    async fn close_context(&self) -> IngestResult<()>;
    /// Close the browser process.
    async fn close_browser(&self) -> IngestResult<()>;
    /// Stop the task driving the browser connection.
    async fn stop_driver(&self) -> IngestResult<()>;
}

/// A single page.
#[async_trait]
pub trait RenderPage: Send + Sync {
    /// Navigate and resolve once the document content has loaded.
    ///
    /// No timeout is applied here; the session bounds the call.
    async fn goto(&self, url: &str) -> IngestResult<()>;
    /// Probe once for an element matching `selector`.
    async fn has_selector(&self, selector: &str) -> IngestResult<bool>;
    /// Serialized DOM of the current document.
    async fn html(&self) -> IngestResult<String>;
    async fn close(self: Box<Self>) -> IngestResult<()>;
}

/// Launcher used in HTTP-only mode.
///
/// Launch always succeeds, but every navigation fails, so rendered sources
/// yield empty results without a browser process.
pub struct NoopLauncher;

#[async_trait]
impl Launcher for NoopLauncher {
    async fn launch(&self) -> IngestResult<Box<dyn Renderer>> {
        Ok(Box::new(NoopRenderer))
    }
}

struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_page(&self) -> IngestResult<Box<dyn RenderPage>> {
        Ok(Box::new(NoopPage))
    }
    async fn close_context(&self) -> IngestResult<()> {
        Ok(())
    }
    async fn close_browser(&self) -> IngestResult<()> {
        Ok(())
    }
    async fn stop_driver(&self) -> IngestResult<()> {
        Ok(())
    }
}

struct NoopPage;

#[async_trait]
impl RenderPage for NoopPage {
    async fn goto(&self, url: &str) -> IngestResult<()> {
        Err(IngestError::navigation(url, "browser not available (HTTP-only mode)"))
    }
    async fn has_selector(&self, _selector: &str) -> IngestResult<bool> {
        Ok(false)
    }
    async fn html(&self) -> IngestResult<String> {
        Ok(String::new())
    }
    async fn close(self: Box<Self>) -> IngestResult<()> {
        Ok(())
    }
}
