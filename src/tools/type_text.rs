//! Text entry: fill an indexed field, or send key strokes to the focused element

use std::time::Duration;

use super::{AutomationEngine, element_not_found};
use crate::actions::{InputTextAction, SendKeysAction};
use crate::dom::resolve_live;
use crate::result::{ActionResult, Outcome};
use crate::utils::keys::KeyInput;
use crate::utils::EngineError;

impl AutomationEngine {
    pub async fn input_text(&self, params: InputTextAction) -> ActionResult {
        self.run("input_text", |page| async move {
            let Some(element) = resolve_live(page.as_ref(), params.index).await? else {
                return Ok(element_not_found(params.index));
            };

            element.handle.fill(&params.text).await?;
            self.settle(page.as_ref(), self.config.action_settle_timeout_ms).await;

            Ok(Outcome::success(format!(
                "Input '{}' into element {}",
                params.text, params.index
            )))
        })
        .await
    }

    /// Modifier chords and named keys are pressed once; anything else is
    /// typed character by character with the configured delay.
    pub async fn send_keys(&self, params: SendKeysAction) -> ActionResult {
        self.run("send_keys", |page| async move {
            if params.keys.is_empty() {
                return Err(EngineError::invalid_argument("keys must not be empty"));
            }

            match KeyInput::parse(&params.keys) {
                KeyInput::Chord(chord) | KeyInput::Named(chord) => {
                    page.press_key(&chord).await?;
                }
                KeyInput::Text(text) => {
                    let delay = Duration::from_millis(self.config.typing_delay_ms);
                    for ch in text.chars() {
                        page.type_char(ch).await?;
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
            self.settle(page.as_ref(), self.config.action_settle_timeout_ms).await;

            Ok(Outcome::success(format!("Sent keys: {}", params.keys)))
        })
        .await
    }
}
