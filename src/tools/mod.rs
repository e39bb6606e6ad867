//! Action executor
//!
//! Every action runs through [`AutomationEngine::run`]:
//! 1. resolve the active page (may trigger session recovery)
//! 2. perform the interaction, returning an [`Outcome`] or an error
//! 3. capture the state of whichever page is active afterwards
//!
//! Errors never escape: they become `success=false` results that still carry
//! a best-effort snapshot.

mod click;
mod drag_drop;
mod dropdown;
mod extract_text;
mod navigate;
mod scroll;
mod tabs;
mod type_text;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions::Action;
use crate::browser::{BrowserLauncher, ChromiumLauncher, PageDriver};
use crate::manager::{SessionError, SessionManager};
use crate::ocr::{NoopOcr, OcrEngine, TesseractOcr};
use crate::result::{ActionResult, Outcome};
use crate::snapshot::{SnapshotBuilder, StateCapture};
use crate::utils::{EngineResult, interaction_timeout};
use crate::{Config, EngineConfig};

/// Static acknowledgement returned by the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

pub struct AutomationEngine {
    session: Arc<SessionManager>,
    snapshots: SnapshotBuilder,
    config: EngineConfig,
}

impl AutomationEngine {
    pub fn new(config: EngineConfig, launcher: Arc<dyn BrowserLauncher>, ocr: Arc<dyn OcrEngine>) -> Self {
        let session = Arc::new(SessionManager::new(
            launcher,
            config.start_url.clone(),
            Duration::from_millis(config.navigation_timeout_ms),
        ));
        Self {
            session,
            snapshots: SnapshotBuilder::new(&config, ocr),
            config,
        }
    }

    /// Engine backed by a real Chromium and, when enabled, tesseract OCR
    pub fn from_config(config: &Config) -> Self {
        let launcher: Arc<dyn BrowserLauncher> = Arc::new(ChromiumLauncher::new(config.browser.clone()));
        let ocr: Arc<dyn OcrEngine> = if config.ocr.enabled {
            Arc::new(TesseractOcr::new(&config.ocr))
        } else {
            Arc::new(NoopOcr)
        };
        Self::new(config.engine.clone(), launcher, ocr)
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Launch the browser and open the start page
    pub async fn initialize(&self) -> Result<(), SessionError> {
        self.session.initialize().await
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.session.shutdown().await
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            message: "Browser automation engine is running".to_string(),
        }
    }

    pub async fn execute(&self, action: Action) -> ActionResult {
        match action {
            Action::NavigateTo(params) => self.navigate_to(params).await,
            Action::SearchGoogle(params) => self.search_google(params).await,
            Action::GoBack(_) => self.go_back().await,
            Action::Wait(params) => self.wait(params).await,
            Action::ClickElement(params) => self.click_element(params).await,
            Action::ClickCoordinates(params) => self.click_coordinates(params).await,
            Action::InputText(params) => self.input_text(params).await,
            Action::SendKeys(params) => self.send_keys(params).await,
            Action::ScrollDown(params) => self.scroll_down(params).await,
            Action::ScrollUp(params) => self.scroll_up(params).await,
            Action::ScrollToText(params) => self.scroll_to_text(params).await,
            Action::SwitchTab(params) => self.switch_tab(params).await,
            Action::OpenTab(params) => self.open_tab(params).await,
            Action::CloseTab(params) => self.close_tab(params).await,
            Action::ExtractContent(params) => self.extract_content(params).await,
            Action::SavePdf(_) => self.save_pdf().await,
            Action::GetDropdownOptions(params) => self.get_dropdown_options(params).await,
            Action::SelectDropdownOption(params) => self.select_dropdown_option(params).await,
            Action::DragDrop(params) => self.drag_drop(params).await,
        }
    }

    /// Shared handler template; `op` performs the interaction on the active page
    async fn run<F, Fut>(&self, label: &str, op: F) -> ActionResult
    where
        F: FnOnce(Arc<dyn PageDriver>) -> Fut,
        Fut: Future<Output = EngineResult<Outcome>>,
    {
        info!("Executing {}", label);

        let page = match self.session.current_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!("No usable page for {}: {}", label, e);
                return ActionResult::from_capture(
                    Outcome::failure(format!("Failed to {}", label.replace('_', " ")), e.to_string()),
                    StateCapture::empty(),
                    None,
                );
            }
        };

        let outcome = match op(page.clone()).await {
            Ok(outcome) => {
                if !outcome.success {
                    info!("{} did not succeed: {}", label, outcome.message);
                }
                outcome
            }
            Err(e) => {
                warn!("{} failed: {}", label, e);
                Outcome::failure(format!("Failed to {}", label.replace('_', " ")), e.to_string())
            }
        };

        let capture = self.capture_active(label).await;
        let fallback_url = if capture.snapshot.is_none() {
            page.url().await.ok()
        } else {
            None
        };
        ActionResult::from_capture(outcome, capture, fallback_url)
    }

    /// Snapshot whichever page is active now; empty if none can be resolved
    async fn capture_active(&self, label: &str) -> StateCapture {
        match self.session.current_page().await {
            Ok(page) => self.snapshots.capture(page.as_ref(), label).await,
            Err(e) => {
                warn!("Recovery snapshot after {} failed: {}", label, e);
                StateCapture::empty()
            }
        }
    }

    /// Best-effort load wait; a timeout degrades to the fixed fallback delay
    async fn settle(&self, page: &dyn PageDriver, timeout_ms: u64) {
        if let Err(e) = page.wait_for_load(interaction_timeout(timeout_ms)).await {
            debug!("Settle wait ended early ({}), sleeping {}ms", e, self.config.fallback_delay_ms);
            tokio::time::sleep(Duration::from_millis(self.config.fallback_delay_ms)).await;
        }
    }
}

/// Failure outcome for an index missing from the fresh scan
fn element_not_found(index: u32) -> Outcome {
    Outcome::failure(
        format!("Element with index {} not found", index),
        format!("No interactive element with index {} on the current page", index),
    )
}
