//! Uniform action result returned for every action invocation

use serde::{Deserialize, Serialize};

use crate::snapshot::{ElementSummary, StateCapture};
use crate::utils::constants::{ERROR_PAGE_TITLE, PLACEHOLDER_URL};

/// Outcome of an action's core interaction step
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub content: Option<String>,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: error.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Flat, serializable result of one action.
///
/// `url` and `title` are always populated, with placeholders when the page
/// could not be read. OCR text and the element summary are always present,
/// possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub url: String,
    pub title: String,
    /// Formatted listing of indexed elements
    pub elements: String,
    /// Base64 JPEG of the viewport
    pub screenshot: String,
    pub pixels_above: u64,
    pub pixels_below: u64,
    pub ocr_text: String,
    pub element_count: usize,
    pub interactive_elements: Vec<ElementSummary>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ActionResult {
    /// Combine an outcome with the state captured after it.
    ///
    /// `fallback_url` is used when the capture has no snapshot.
    pub fn from_capture(outcome: Outcome, capture: StateCapture, fallback_url: Option<String>) -> Self {
        let (url, title, pixels_above, pixels_below) = match capture.snapshot {
            Some(snapshot) => (
                snapshot.url,
                snapshot.title,
                snapshot.scroll.pixels_above,
                snapshot.scroll.pixels_below,
            ),
            None => (
                fallback_url.unwrap_or_else(|| PLACEHOLDER_URL.to_string()),
                ERROR_PAGE_TITLE.to_string(),
                0,
                0,
            ),
        };

        Self {
            success: outcome.success,
            message: outcome.message,
            error: outcome.error,
            url,
            title,
            elements: capture.elements,
            screenshot: capture.screenshot,
            pixels_above,
            pixels_below,
            ocr_text: capture.metadata.ocr_text,
            element_count: capture.metadata.element_count,
            interactive_elements: capture.metadata.interactive_elements,
            viewport_width: capture.metadata.viewport_width,
            viewport_height: capture.metadata.viewport_height,
            content: outcome.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_snapshot_uses_placeholders() {
        let result = ActionResult::from_capture(
            Outcome::failure("Action failed", "boom"),
            StateCapture::empty(),
            None,
        );
        assert!(!result.success);
        assert_eq!(result.url, "unknown");
        assert_eq!(result.title, "Error page");
        assert_eq!(result.error, "boom");
        assert!(result.interactive_elements.is_empty());
    }

    #[test]
    fn fallback_url_is_preferred_over_placeholder() {
        let result = ActionResult::from_capture(
            Outcome::failure("Action failed", "boom"),
            StateCapture::empty(),
            Some("https://example.com/".to_string()),
        );
        assert_eq!(result.url, "https://example.com/");
    }

    #[test]
    fn serialized_result_is_flat_and_omits_missing_content() {
        let result = ActionResult::from_capture(Outcome::success("ok"), StateCapture::empty(), None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["ocr_text"], "");
        assert!(json["interactive_elements"].is_array());
        assert!(json.get("content").is_none());

        let with_content = Outcome::success("ok").with_content("text");
        let result = ActionResult::from_capture(with_content, StateCapture::empty(), None);
        assert_eq!(serde_json::to_value(&result).unwrap()["content"], "text");
    }
}
