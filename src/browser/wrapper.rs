//! Browser lifecycle for the chromiumoxide driver
//!
//! Owns the launched `Browser`, its CDP event handler task and the temporary
//! profile directory, and exposes them through [`BrowserDriver`].

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserDriver, BrowserLauncher, ChromiumPage, DriverError, DriverResult, PageDriver};
use crate::BrowserConfig;

/// Wrapper for Browser and its event handler task
///
/// Ensures handler is properly cleaned up when browser is dropped.
/// Handler MUST be aborted to prevent it running indefinitely after
/// browser is closed.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub(crate) fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Clean up temp directory (blocking operation)
    ///
    /// MUST be called AFTER `browser.wait()` completes to ensure Chrome
    /// has released all file handles.
    pub fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        debug!("Dropping BrowserWrapper - aborting handler task");
        self.handler.abort();

        if let Some(path) = self.user_data_dir.as_ref() {
            warn!(
                "BrowserWrapper dropped without explicit shutdown. Temp directory will be orphaned: {}",
                path.display()
            );
        }
    }
}

/// [`BrowserDriver`] over a launched chromiumoxide browser
pub struct ChromiumBrowser {
    // close() and wait() need &mut Browser
    inner: Mutex<Option<BrowserWrapper>>,
}

impl ChromiumBrowser {
    pub fn new(wrapper: BrowserWrapper) -> Self {
        Self {
            inner: Mutex::new(Some(wrapper)),
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromiumBrowser {
    async fn is_connected(&self) -> bool {
        let guard = self.inner.lock().await;
        match guard.as_ref() {
            Some(wrapper) => match wrapper.browser().version().await {
                Ok(_) => true,
                Err(e) => {
                    warn!("Browser health check failed: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    async fn pages(&self) -> DriverResult<Vec<Arc<dyn PageDriver>>> {
        let guard = self.inner.lock().await;
        let wrapper = guard
            .as_ref()
            .ok_or_else(|| DriverError::Protocol("Browser has been shut down".to_string()))?;
        let pages = wrapper.browser().pages().await?;
        Ok(pages
            .into_iter()
            .map(|page| Arc::new(ChromiumPage::new(page)) as Arc<dyn PageDriver>)
            .collect())
    }

    async fn new_page(&self, url: &str) -> DriverResult<Arc<dyn PageDriver>> {
        let guard = self.inner.lock().await;
        let wrapper = guard
            .as_ref()
            .ok_or_else(|| DriverError::PageCreationFailed("Browser has been shut down".to_string()))?;
        let page = wrapper
            .browser()
            .new_page(url)
            .await
            .map_err(|e| DriverError::PageCreationFailed(e.to_string()))?;
        debug!("Created page at {}", url);
        Ok(Arc::new(ChromiumPage::new(page)))
    }

    /// We must call BOTH `close()` and `wait()`: dropping the wrapper only
    /// aborts the handler and leaves a zombie Chrome process.
    async fn shutdown(&self) -> DriverResult<()> {
        let mut guard = self.inner.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down browser");

            if let Err(e) = wrapper.browser_mut().close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = wrapper.browser_mut().wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            wrapper.cleanup_temp_dir();
        }

        Ok(())
    }
}

/// Launches Chrome with a fresh per-launch profile directory
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> DriverResult<Arc<dyn BrowserDriver>> {
        // Unique per launch so a relaunch after a crash never hits a profile lock
        let user_data_dir = std::env::temp_dir().join(format!(
            "indexed_browser_{}_{}",
            std::process::id(),
            rand::random::<u32>()
        ));

        let (browser, handler) =
            crate::browser_setup::launch_browser(&self.config, user_data_dir.clone())
                .await
                .map_err(|e| DriverError::LaunchFailed(format!("{e:#}")))?;

        Ok(Arc::new(ChromiumBrowser::new(BrowserWrapper::new(
            browser,
            handler,
            user_data_dir,
        ))))
    }
}
