//! Session and tab management with health checking and crash recovery
//!
//! # Architecture
//!
//! One `tokio::sync::Mutex` guards the browser handle together with the
//! [`TabRegistry`]:
//! - Lazy launch on first use
//! - Health check on every access, relaunching a disconnected browser
//! - Re-scan of open tabs when the active tab has been closed
//! - A blank tab is created whenever no usable tab is left
//!
//! Browser operations are async, so the lock must be `tokio::sync::Mutex`
//! rather than a sync lock held across `.await` points.
//!
//! # States
//!
//! - *no browser*: the next access launches one
//! - *connected, active tab valid*: the tab is returned as is
//! - *connected, active tab invalid or closed*: open tabs are re-scanned and
//!   adopted, keeping the active tab current if it turns out to be open, or a
//!   fresh blank tab is created

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::{BrowserDriver, BrowserLauncher, DriverError, PageDriver};
use crate::tabs::TabRegistry;
use crate::utils::constants::PLACEHOLDER_URL;

const BLANK_PAGE: &str = "about:blank";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(#[source] DriverError),

    #[error("Tab {index} not found ({count} tabs open)")]
    TabOutOfRange { index: usize, count: usize },

    #[error("Failed to recover a usable page: {0}")]
    Recovery(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

struct SessionState {
    browser: Option<Arc<dyn BrowserDriver>>,
    tabs: TabRegistry<dyn PageDriver>,
}

/// Owns the browser connection and the open tabs
pub struct SessionManager {
    launcher: Arc<dyn BrowserLauncher>,
    start_url: String,
    navigation_timeout: Duration,
    state: Mutex<SessionState>,
}

impl SessionManager {
    /// The browser is launched lazily on first access
    pub fn new(launcher: Arc<dyn BrowserLauncher>, start_url: impl Into<String>, navigation_timeout: Duration) -> Self {
        Self {
            launcher,
            start_url: start_url.into(),
            navigation_timeout,
            state: Mutex::new(SessionState {
                browser: None,
                tabs: TabRegistry::new(),
            }),
        }
    }

    /// Launch eagerly and open the start URL in the first tab
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let page = self.current_page().await?;
        if self.start_url != BLANK_PAGE {
            let current = page.url().await.unwrap_or_default();
            if current == BLANK_PAGE || current.is_empty() {
                info!("Opening start page {}", self.start_url);
                if let Err(e) = page.navigate(&self.start_url, self.navigation_timeout).await {
                    warn!("Failed to open start page {}: {}", self.start_url, e);
                }
            }
        }
        Ok(())
    }

    async fn ensure_browser(&self, state: &mut SessionState) -> Result<Arc<dyn BrowserDriver>, SessionError> {
        if let Some(browser) = state.browser.clone() {
            if browser.is_connected().await {
                debug!("Browser health check passed, reusing existing browser");
                return Ok(browser);
            }

            warn!("Browser health check failed. Triggering recovery...");
            // Best-effort cleanup, the process may already be gone
            if let Err(e) = browser.shutdown().await {
                warn!("Failed to shut down disconnected browser: {}", e);
            }
            state.browser = None;
            state.tabs.clear();
        }

        info!("Launching browser (first time or after recovery)");
        let browser = self.launcher.launch().await.map_err(SessionError::Launch)?;
        state.browser = Some(browser.clone());
        state.tabs.clear();
        Ok(browser)
    }

    async fn ensure_page(
        &self,
        state: &mut SessionState,
        browser: &Arc<dyn BrowserDriver>,
    ) -> Result<Arc<dyn PageDriver>, SessionError> {
        let mut active_id = None;
        if let Some(page) = state.tabs.current() {
            if page.is_open().await {
                return Ok(page);
            }
            warn!("Active tab is closed, re-scanning open tabs");
            active_id = Some(page.id());
        }

        let mut open = Vec::new();
        match browser.pages().await {
            Ok(pages) => {
                for page in pages {
                    if page.is_open().await {
                        open.push(page);
                    }
                }
            }
            Err(e) => warn!("Failed to list open tabs: {}", e),
        }

        if open.is_empty() {
            info!("No open tabs, creating a blank one");
            let page = browser
                .new_page(BLANK_PAGE)
                .await
                .map_err(|e| SessionError::Recovery(e.to_string()))?;
            open.push(page);
        } else {
            debug!("Adopting {} open tab(s)", open.len());
        }
        state
            .tabs
            .adopt(open, |page| active_id.as_deref() == Some(page.id().as_str()));

        state
            .tabs
            .current()
            .ok_or_else(|| SessionError::Recovery("tab registry is empty".to_string()))
    }

    /// The page to act on. Never returns a closed or stale handle.
    pub async fn current_page(&self) -> Result<Arc<dyn PageDriver>, SessionError> {
        let mut state = self.state.lock().await;
        let browser = self.ensure_browser(&mut state).await?;
        self.ensure_page(&mut state, &browser).await
    }

    pub async fn switch_tab(&self, index: usize) -> Result<Arc<dyn PageDriver>, SessionError> {
        let mut state = self.state.lock().await;
        let browser = self.ensure_browser(&mut state).await?;
        self.ensure_page(&mut state, &browser).await?;

        let page = state.tabs.switch_to(index)?;
        if let Err(e) = page.bring_to_front().await {
            debug!("Failed to bring tab {} to front: {}", index, e);
        }
        info!("Switched to tab {}", index);
        Ok(page)
    }

    /// Create a blank tab and make it current; returns its index
    pub async fn open_tab(&self) -> Result<(usize, Arc<dyn PageDriver>), SessionError> {
        let mut state = self.state.lock().await;
        let browser = self.ensure_browser(&mut state).await?;
        self.ensure_page(&mut state, &browser).await?;

        let page = browser.new_page(BLANK_PAGE).await?;
        let index = state.tabs.push(page.clone());
        info!("Opened tab {}", index);
        Ok((index, page))
    }

    /// Close a tab; returns the URL it was showing.
    ///
    /// Closing the only tab opens a blank replacement first.
    pub async fn close_tab(&self, index: usize) -> Result<String, SessionError> {
        let mut state = self.state.lock().await;
        let browser = self.ensure_browser(&mut state).await?;
        self.ensure_page(&mut state, &browser).await?;

        if index >= state.tabs.len() {
            return Err(SessionError::TabOutOfRange {
                index,
                count: state.tabs.len(),
            });
        }

        if state.tabs.len() == 1 {
            let replacement = browser.new_page(BLANK_PAGE).await?;
            state.tabs.push(replacement);
        }

        let page = state.tabs.remove(index)?;
        let url = page.url().await.unwrap_or_else(|_| PLACEHOLDER_URL.to_string());
        if let Err(e) = page.close().await {
            warn!("Failed to close tab {}: {}", index, e);
        }

        if state.tabs.is_empty() {
            let replacement = browser.new_page(BLANK_PAGE).await?;
            state.tabs.push(replacement);
        }
        if let Some(current) = state.tabs.current()
            && let Err(e) = current.bring_to_front().await
        {
            debug!("Failed to bring active tab to front: {}", e);
        }

        info!("Closed tab {} ({})", index, url);
        Ok(url)
    }

    pub async fn tab_count(&self) -> usize {
        self.state.lock().await.tabs.len()
    }

    pub async fn active_index(&self) -> Option<usize> {
        self.state.lock().await.tabs.current_index()
    }

    pub async fn is_browser_running(&self) -> bool {
        self.state.lock().await.browser.is_some()
    }

    /// Close the browser if running. Safe to call multiple times.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        state.tabs.clear();
        if let Some(browser) = state.browser.take() {
            info!("Shutting down browser session");
            browser.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        // Not a clean shutdown: only the browser's own Drop runs.
        // Call shutdown().await before dropping.
        debug!("SessionManager dropping");
    }
}
