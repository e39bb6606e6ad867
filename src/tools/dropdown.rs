//! Dropdown actions
//!
//! Native `<select>` elements are read and set directly. Anything else is
//! treated as a custom dropdown: it is clicked open and the visible option-like
//! elements are searched by text. The custom path is a heuristic over
//! arbitrary markup and can miss widgets that render their options elsewhere.

use std::time::Duration;

use tracing::debug;

use super::{AutomationEngine, element_not_found};
use crate::actions::{GetDropdownOptionsAction, SelectDropdownOptionAction};
use crate::browser::{DropdownOption, PageDriver};
use crate::dom::{LiveElement, resolve_live};
use crate::result::{ActionResult, Outcome};
use crate::utils::EngineResult;
use crate::utils::constants::SCROLL_SETTLE_MS;

fn format_options(options: &[DropdownOption]) -> String {
    options
        .iter()
        .map(|o| format!("{}: text={:?}, value={:?}", o.index, o.text, o.value))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn open_custom_dropdown(element: &LiveElement) -> EngineResult<()> {
    element.handle.click().await?;
    tokio::time::sleep(Duration::from_millis(SCROLL_SETTLE_MS)).await;
    Ok(())
}

async fn read_options(page: &dyn PageDriver, element: &LiveElement) -> EngineResult<Vec<DropdownOption>> {
    if element.tag_name == "select" {
        return Ok(element.handle.select_options().await?);
    }
    debug!("Element {} is <{}>, trying custom dropdown", element.index, element.tag_name);
    open_custom_dropdown(element).await?;
    Ok(page.visible_options().await?)
}

async fn choose_option(page: &dyn PageDriver, element: &LiveElement, text: &str) -> EngineResult<bool> {
    if element.tag_name == "select" {
        return Ok(element.handle.select_option_by_text(text).await?);
    }
    open_custom_dropdown(element).await?;
    let Some(option) = page.find_text(text).await? else {
        return Ok(false);
    };
    if !option.is_visible().await? {
        return Ok(false);
    }
    option.click().await?;
    Ok(true)
}

impl AutomationEngine {
    /// Options are returned in control order as JSON in `content`
    pub async fn get_dropdown_options(&self, params: GetDropdownOptionsAction) -> ActionResult {
        self.run("get_dropdown_options", |page| async move {
            let Some(element) = resolve_live(page.as_ref(), params.index).await? else {
                return Ok(element_not_found(params.index));
            };

            let options = read_options(page.as_ref(), &element).await?;
            if options.is_empty() {
                return Ok(Outcome::failure(
                    format!("No options found in dropdown {}", params.index),
                    "dropdown has no options",
                ));
            }

            let json = serde_json::to_string(&options)?;
            Ok(Outcome::success(format!(
                "Found {} options in dropdown {}:\n{}",
                options.len(),
                params.index,
                format_options(&options)
            ))
            .with_content(json))
        })
        .await
    }

    pub async fn select_dropdown_option(&self, params: SelectDropdownOptionAction) -> ActionResult {
        self.run("select_dropdown_option", |page| async move {
            let Some(element) = resolve_live(page.as_ref(), params.index).await? else {
                return Ok(element_not_found(params.index));
            };

            if !choose_option(page.as_ref(), &element, &params.text).await? {
                return Ok(Outcome::failure(
                    format!("Option '{}' not found in dropdown {}", params.text, params.index),
                    "option not found",
                ));
            }
            self.settle(page.as_ref(), self.config.action_settle_timeout_ms).await;

            Ok(Outcome::success(format!(
                "Selected option '{}' in dropdown {}",
                params.text, params.index
            )))
        })
        .await
    }
}
