//! Snapshot building: indexed tree + URL/title + scroll metrics + screenshot + OCR
//!
//! [`SnapshotBuilder::capture`] never fails. Each sub-step that errors is
//! logged and its field falls back to an empty or zero value, so one broken
//! read never hides the others.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::EngineConfig;
use crate::browser::{PageDriver, ScreenshotOptions, ScrollMetrics, ViewportSize};
use crate::dom::{DomTree, IndexedDom, SelectorMap, clickable_elements_to_string, index_page};
use crate::ocr::OcrEngine;
use crate::utils::constants::{
    PLACEHOLDER_TITLE, PLACEHOLDER_URL, SUMMARY_ATTRIBUTES, SUMMARY_FIELD_MAX_CHARS,
};

/// Page state at one instant. Built fresh on every read and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub dom: IndexedDom,
    pub url: String,
    pub title: String,
    pub scroll: ScrollMetrics,
}

impl PageSnapshot {
    pub fn element_tree(&self) -> &DomTree {
        &self.dom.tree
    }

    pub fn selector_map(&self) -> &SelectorMap {
        &self.dom.selector_map
    }
}

/// Compact description of one indexed element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub index: u32,
    pub tag_name: String,
    pub text: String,
    pub is_in_viewport: bool,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub element_count: usize,
    pub interactive_elements: Vec<ElementSummary>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub ocr_text: String,
}

/// Everything a snapshot build produces
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateCapture {
    /// `None` when no page could be resolved at all
    pub snapshot: Option<PageSnapshot>,
    /// Base64 JPEG, empty when the screenshot failed
    pub screenshot: String,
    /// Formatted element listing, empty when not computed
    pub elements: String,
    pub metadata: SnapshotMetadata,
}

impl StateCapture {
    /// Capture for when there is no page to look at
    pub fn empty() -> Self {
        Self::default()
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value.to_string(),
    }
}

/// Summaries for every indexed element, fields bounded in length
pub fn summarize_elements(dom: &IndexedDom) -> Vec<ElementSummary> {
    dom.indexed_elements()
        .map(|(index, id, element)| {
            let text = dom.tree.all_text_till_next_clickable_element(id, None);
            let attributes = SUMMARY_ATTRIBUTES
                .iter()
                .filter_map(|name| {
                    element
                        .attributes
                        .get(*name)
                        .filter(|value| !value.is_empty())
                        .map(|value| (name.to_string(), truncate_chars(value, SUMMARY_FIELD_MAX_CHARS)))
                })
                .collect();
            ElementSummary {
                index,
                tag_name: element.tag_name.clone(),
                text: truncate_chars(&text, SUMMARY_FIELD_MAX_CHARS),
                is_in_viewport: element.is_in_viewport,
                attributes,
            }
        })
        .collect()
}

pub struct SnapshotBuilder {
    ocr: Arc<dyn OcrEngine>,
    settle_delay: Duration,
    screenshot_settle_timeout: Duration,
    screenshot: ScreenshotOptions,
    include_attributes: Vec<String>,
}

impl SnapshotBuilder {
    pub fn new(config: &EngineConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            screenshot_settle_timeout: Duration::from_millis(config.screenshot_settle_timeout_ms),
            screenshot: ScreenshotOptions {
                quality: config.screenshot_quality,
                full_page: false,
            },
            include_attributes: config.include_attributes.clone(),
        }
    }

    /// Index the page and read URL, title and scroll metrics
    pub async fn build_snapshot(&self, page: &dyn PageDriver) -> PageSnapshot {
        let dom = index_page(page).await;
        let (url, title, scroll) = tokio::join!(page.url(), page.title(), page.scroll_metrics());

        let url = url.unwrap_or_else(|e| {
            warn!("Failed to read page URL: {}", e);
            PLACEHOLDER_URL.to_string()
        });
        let title = title.unwrap_or_else(|e| {
            warn!("Failed to read page title: {}", e);
            PLACEHOLDER_TITLE.to_string()
        });
        let scroll = scroll.unwrap_or_else(|e| {
            warn!("Failed to read scroll metrics: {}", e);
            ScrollMetrics::default()
        });

        PageSnapshot {
            dom,
            url,
            title,
            scroll,
        }
    }

    /// Full capture of `page` after the settle delay
    pub async fn capture(&self, page: &dyn PageDriver, label: &str) -> StateCapture {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let snapshot = self.build_snapshot(page).await;
        let viewport = page.viewport().await.unwrap_or_else(|e| {
            warn!("Failed to read viewport size: {}", e);
            ViewportSize::default()
        });

        let image = self.take_screenshot(page).await;
        let ocr_text = self.recognize(&image).await;

        let elements = clickable_elements_to_string(snapshot.element_tree(), &self.include_attributes);
        let interactive_elements = summarize_elements(&snapshot.dom);
        debug!(
            "Captured state after {}: {} elements, {} byte screenshot",
            label,
            snapshot.dom.element_count(),
            image.len()
        );

        StateCapture {
            metadata: SnapshotMetadata {
                element_count: snapshot.dom.element_count(),
                interactive_elements,
                viewport_width: viewport.width,
                viewport_height: viewport.height,
                ocr_text,
            },
            screenshot: if image.is_empty() {
                String::new()
            } else {
                BASE64.encode(&image)
            },
            elements,
            snapshot: Some(snapshot),
        }
    }

    async fn take_screenshot(&self, page: &dyn PageDriver) -> Vec<u8> {
        if let Err(e) = page.wait_for_load(self.screenshot_settle_timeout).await {
            debug!("Page not idle before screenshot: {}", e);
        }
        page.screenshot(&self.screenshot).await.unwrap_or_else(|e| {
            warn!("Screenshot failed: {}", e);
            Vec::new()
        })
    }

    async fn recognize(&self, image: &[u8]) -> String {
        if image.is_empty() {
            return String::new();
        }
        self.ocr.recognize(image).await.unwrap_or_else(|e| {
            warn!("OCR failed: {}", e);
            String::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{RawCandidate, Rect};

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn summaries_are_bounded_and_keep_selected_attributes() {
        let long_text = "x".repeat(250);
        let candidate = RawCandidate {
            tag_name: "a".to_string(),
            text: long_text,
            attributes: BTreeMap::from([
                ("href".to_string(), "/next".to_string()),
                ("class".to_string(), "btn".to_string()),
                ("title".to_string(), String::new()),
            ]),
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
            in_layout: true,
            viewport_rect: Some(Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            }),
            in_viewport: true,
            ..RawCandidate::default()
        };
        let dom = IndexedDom::from_candidates(&[candidate]);
        let summaries = summarize_elements(&dom);

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.index, 1);
        assert_eq!(summary.text.chars().count(), SUMMARY_FIELD_MAX_CHARS);
        assert_eq!(
            summary.attributes,
            BTreeMap::from([("href".to_string(), "/next".to_string())])
        );

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["href"], "/next");
        assert_eq!(json["tag_name"], "a");
    }
}
