//! Browser lifecycle management for the research session
//!
//! Handles launching the chromiumoxide browser against the persistent profile
//! directory and tearing it down again.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide_cdp::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::ChromePage;
use crate::BrowserConfig;

/// Installed on every document so page scripts see no webdriver flag.
pub(crate) const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Wrapper for Browser and its event handler task
///
/// Ensures handler is properly cleaned up when browser is dropped.
/// Handler MUST be aborted to prevent it running indefinitely after
/// browser is closed.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>) -> Self {
        Self { browser, handler }
    }

    /// Get reference to inner browser
    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Close the browser process and wait for it to exit.
    ///
    /// The profile directory is left in place: it holds the logged-in
    /// session that the next run reuses.
    pub async fn shutdown(mut self) {
        info!("Shutting down browser");

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }

        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        info!("Dropping BrowserWrapper - aborting handler task");
        self.handler.abort();
    }
}

/// Launch the browser against the configured persistent profile.
///
/// # Handler Lifecycle
/// The CDP handler task is owned by the returned wrapper and aborted when it
/// drops.
pub async fn launch_browser(config: &BrowserConfig) -> Result<BrowserWrapper> {
    info!(
        "Launching research browser with profile {}",
        config.profile_dir.display()
    );

    let (browser, handler) = crate::browser_setup::launch_browser(config).await?;

    Ok(BrowserWrapper::new(browser, handler))
}

/// Get the page the session will drive for its whole lifetime.
///
/// Reuses the first tab a persistent profile restores; opens a blank one
/// otherwise.
pub async fn open_session_page(wrapper: &BrowserWrapper) -> Result<ChromePage> {
    let pages = wrapper
        .browser()
        .pages()
        .await
        .context("Failed to get browser pages")?;

    let page = match pages.into_iter().next() {
        Some(page) => page,
        None => wrapper
            .browser()
            .new_page("about:blank")
            .await
            .context("Failed to create blank page")?,
    };

    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
        HIDE_WEBDRIVER_SCRIPT,
    ))
    .await
    .context("Failed to install webdriver override")?;
    // the restored tab's current document was loaded before the script existed
    if let Err(e) = page.evaluate(HIDE_WEBDRIVER_SCRIPT).await {
        warn!("Failed to hide webdriver flag on current document: {}", e);
    }

    info!("Session page ready");
    Ok(ChromePage::new(page))
}
