//! Tab actions: switch, open and close

use tracing::debug;

use super::AutomationEngine;
use crate::actions::{CloseTabAction, OpenTabAction, SwitchTabAction};
use crate::manager::SessionError;
use crate::result::{ActionResult, Outcome};
use crate::utils::EngineResult;

/// Out-of-range tab indices are resolution failures, not errors
fn tab_outcome<T>(result: Result<T, SessionError>, on_ok: impl FnOnce(T) -> Outcome) -> EngineResult<Outcome> {
    match result {
        Ok(value) => Ok(on_ok(value)),
        Err(e @ SessionError::TabOutOfRange { .. }) => Ok(Outcome::failure("Tab not found", e.to_string())),
        Err(e) => Err(e.into()),
    }
}

impl AutomationEngine {
    pub async fn switch_tab(&self, params: SwitchTabAction) -> ActionResult {
        self.run("switch_tab", |_page| async move {
            let result = self.session.switch_tab(params.page_id).await;
            if let Ok(page) = &result {
                self.settle(page.as_ref(), self.config.load_timeout_ms).await;
            }
            tab_outcome(result, |_| Outcome::success(format!("Switched to tab {}", params.page_id)))
        })
        .await
    }

    pub async fn open_tab(&self, params: OpenTabAction) -> ActionResult {
        self.run("open_tab", |_page| async move {
            let (index, page) = self.session.open_tab().await?;
            self.load(page.as_ref(), &params.url).await?;
            Ok(Outcome::success(format!("Opened new tab {} with {}", index, params.url)))
        })
        .await
    }

    /// Closing the last tab leaves a fresh blank one behind
    pub async fn close_tab(&self, params: CloseTabAction) -> ActionResult {
        self.run("close_tab", |_page| async move {
            let result = self.session.close_tab(params.page_id).await;
            debug!("{} tab(s) open after close", self.session.tab_count().await);
            tab_outcome(result, |url| {
                Outcome::success(format!("Closed tab {} ({})", params.page_id, url))
            })
        })
        .await
    }
}
