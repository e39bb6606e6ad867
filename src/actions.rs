//! Typed action parameters
//!
//! Each struct is the JSON body of one action. [`Action`] ties an action name
//! to its parameters for generic dispatch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoToUrlAction {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGoogleAction {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaitAction {
    #[serde(default)]
    pub seconds: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickElementAction {
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickCoordinatesAction {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTextAction {
    pub index: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendKeysAction {
    pub keys: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollAction {
    /// Pixels; one viewport height when absent
    #[serde(default)]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollToTextAction {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchTabAction {
    pub page_id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTabAction {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseTabAction {
    pub page_id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractContentAction {
    #[serde(default)]
    pub goal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDropdownOptionsAction {
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectDropdownOptionAction {
    pub index: u32,
    pub text: String,
}

/// Body of actions that take no parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoParams {}

/// Offset from an element's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Drag between two elements (CSS selectors) or two coordinate pairs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDropAction {
    pub element_source: Option<String>,
    pub element_target: Option<String>,
    pub element_source_offset: Option<Position>,
    pub element_target_offset: Option<Position>,
    pub coord_source_x: Option<f64>,
    pub coord_source_y: Option<f64>,
    pub coord_target_x: Option<f64>,
    pub coord_target_y: Option<f64>,
    pub steps: Option<u32>,
    pub delay_ms: Option<u64>,
}

/// Action name plus typed parameters, as `{"action": ..., "params": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Action {
    NavigateTo(GoToUrlAction),
    SearchGoogle(SearchGoogleAction),
    GoBack(NoParams),
    Wait(WaitAction),
    ClickElement(ClickElementAction),
    ClickCoordinates(ClickCoordinatesAction),
    InputText(InputTextAction),
    SendKeys(SendKeysAction),
    ScrollDown(ScrollAction),
    ScrollUp(ScrollAction),
    ScrollToText(ScrollToTextAction),
    SwitchTab(SwitchTabAction),
    OpenTab(OpenTabAction),
    CloseTab(CloseTabAction),
    ExtractContent(ExtractContentAction),
    SavePdf(NoParams),
    GetDropdownOptions(GetDropdownOptionsAction),
    SelectDropdownOption(SelectDropdownOptionAction),
    DragDrop(DragDropAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::NavigateTo(_) => "navigate_to",
            Action::SearchGoogle(_) => "search_google",
            Action::GoBack(_) => "go_back",
            Action::Wait(_) => "wait",
            Action::ClickElement(_) => "click_element",
            Action::ClickCoordinates(_) => "click_coordinates",
            Action::InputText(_) => "input_text",
            Action::SendKeys(_) => "send_keys",
            Action::ScrollDown(_) => "scroll_down",
            Action::ScrollUp(_) => "scroll_up",
            Action::ScrollToText(_) => "scroll_to_text",
            Action::SwitchTab(_) => "switch_tab",
            Action::OpenTab(_) => "open_tab",
            Action::CloseTab(_) => "close_tab",
            Action::ExtractContent(_) => "extract_content",
            Action::SavePdf(_) => "save_pdf",
            Action::GetDropdownOptions(_) => "get_dropdown_options",
            Action::SelectDropdownOption(_) => "select_dropdown_option",
            Action::DragDrop(_) => "drag_drop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_deserialize_from_tagged_json() {
        let action: Action = serde_json::from_str(
            r#"{"action": "input_text", "params": {"index": 3, "text": "hello"}}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::InputText(InputTextAction {
                index: 3,
                text: "hello".to_string()
            })
        );
        assert_eq!(action.name(), "input_text");

        let action: Action = serde_json::from_str(r#"{"action": "go_back", "params": {}}"#).unwrap();
        assert_eq!(action, Action::GoBack(NoParams {}));
    }

    #[test]
    fn optional_parameters_default() {
        let scroll: ScrollAction = serde_json::from_str("{}").unwrap();
        assert_eq!(scroll.amount, None);

        let drag: DragDropAction =
            serde_json::from_str(r#"{"coord_source_x": 1, "coord_source_y": 2}"#).unwrap();
        assert_eq!(drag.coord_source_x, Some(1.0));
        assert_eq!(drag.steps, None);
    }
}
