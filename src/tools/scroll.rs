//! Scroll actions: by pixels, by one page, or until some text is in view

use std::time::Duration;

use tracing::debug;

use super::AutomationEngine;
use crate::actions::{ScrollAction, ScrollToTextAction};
use crate::browser::PageDriver;
use crate::result::{ActionResult, Outcome};
use crate::utils::constants::SCROLL_SETTLE_MS;
use crate::utils::{EngineResult, interaction_timeout, wait_for_visible_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl AutomationEngine {
    async fn scroll(&self, page: &dyn PageDriver, amount: Option<i64>, direction: Direction) -> EngineResult<Outcome> {
        let pixels = match amount {
            Some(amount) => amount.unsigned_abs() as f64,
            None => f64::from(page.viewport().await?.height),
        };
        let dy = match direction {
            Direction::Down => pixels,
            Direction::Up => -pixels,
        };

        page.scroll_by(0.0, dy).await?;
        tokio::time::sleep(Duration::from_millis(SCROLL_SETTLE_MS)).await;

        let word = match direction {
            Direction::Down => "down",
            Direction::Up => "up",
        };
        Ok(Outcome::success(match amount {
            Some(_) => format!("Scrolled {} by {} pixels", word, pixels),
            None => format!("Scrolled {} one page", word),
        }))
    }

    pub async fn scroll_down(&self, params: ScrollAction) -> ActionResult {
        self.run("scroll_down", |page| async move {
            self.scroll(page.as_ref(), params.amount, Direction::Down).await
        })
        .await
    }

    pub async fn scroll_up(&self, params: ScrollAction) -> ActionResult {
        self.run("scroll_up", |page| async move {
            self.scroll(page.as_ref(), params.amount, Direction::Up).await
        })
        .await
    }

    /// Case-insensitive substring search: the text locator first, then an
    /// in-page scan. Not finding the text is a failed outcome, not an error.
    pub async fn scroll_to_text(&self, params: ScrollToTextAction) -> ActionResult {
        self.run("scroll_to_text", |page| async move {
            let text = params.text.trim();
            if text.is_empty() {
                return Ok(Outcome::failure("No text given to scroll to", "text must not be empty"));
            }

            match page.find_text(text).await {
                Ok(Some(element)) => {
                    if let Err(e) = element.focus().await {
                        debug!("Could not focus match for '{}': {}", text, e);
                    }
                    match element.scroll_into_view().await {
                        Ok(()) => {
                            if element.is_visible().await.unwrap_or(false) {
                                tokio::time::sleep(Duration::from_millis(SCROLL_SETTLE_MS)).await;
                                return Ok(Outcome::success(format!("Scrolled to text: {}", text)));
                            }
                            debug!("Locator match for '{}' is not visible, scanning the page", text);
                        }
                        Err(e) => debug!("Locator match for '{}' could not be scrolled: {}", text, e),
                    }
                }
                Ok(None) => debug!("Text locator found no match for '{}'", text),
                Err(e) => debug!("Text locator failed for '{}': {}", text, e),
            }

            if page.scroll_text_into_view(text).await? {
                let timeout = interaction_timeout(self.config.action_settle_timeout_ms);
                if wait_for_visible_text(page.as_ref(), text, timeout).await {
                    return Ok(Outcome::success(format!("Scrolled to text: {}", text)));
                }
                debug!("'{}' scrolled into view but not confirmed visible", text);
            }

            Ok(Outcome::failure(
                format!("Text '{}' not found or not visible on page", text),
                format!("Text '{}' not found", text),
            ))
        })
        .await
    }
}
