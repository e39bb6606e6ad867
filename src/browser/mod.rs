//! Browser collaborator interfaces and the chromiumoxide driver
//!
//! The engine talks to the rendering engine only through the traits in this
//! module: [`BrowserLauncher`] creates a [`BrowserDriver`], which hands out
//! [`PageDriver`]s, which in turn resolve [`ElementHandle`]s. The chromiumoxide
//! implementation lives in `wrapper`, `page` and `scripts`.

mod page;
mod scripts;
mod wrapper;

pub use page::{ChromiumElement, ChromiumPage};
pub use wrapper::{BrowserWrapper, ChromiumBrowser, ChromiumLauncher};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::keys::KeyChord;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Failed to find browser executable: {0}")]
    NotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Page is closed")]
    PageClosed,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Protocol(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Script(format!("unexpected script result: {err}"))
    }
}

pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// One element matched by the interactivity selector, as captured by a scan.
///
/// Candidates are reported in document order. `ordinal` is the position in
/// that order and is what [`PageDriver::candidate`] resolves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCandidate {
    pub ordinal: usize,
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    /// innerText, falling back to value and then aria-label
    pub text: String,
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    /// Element participates in layout (has an offset parent or is fixed)
    pub in_layout: bool,
    pub page_rect: Option<Rect>,
    pub viewport_rect: Option<Rect>,
    pub in_viewport: bool,
}

/// Pixels of document above and below the current viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub pixels_above: u64,
    pub pixels_below: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub index: usize,
    pub text: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotOptions {
    /// JPEG quality, 0..=100
    pub quality: u8,
    pub full_page: bool,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            quality: 60,
            full_page: false,
        }
    }
}

/// A live element on a page
#[async_trait]
pub trait ElementHandle: Send + Sync {
    async fn click(&self) -> DriverResult<()>;

    /// Clear the element's value and type `text` into it
    async fn fill(&self, text: &str) -> DriverResult<()>;

    async fn focus(&self) -> DriverResult<()>;

    async fn scroll_into_view(&self) -> DriverResult<()>;

    async fn is_visible(&self) -> DriverResult<bool>;

    /// Viewport-relative bounding box
    async fn bounding_box(&self) -> DriverResult<Rect>;

    /// Options of a native `<select>`, in control order
    async fn select_options(&self) -> DriverResult<Vec<DropdownOption>>;

    /// Select the native option whose text matches; `false` when none matched
    async fn select_option_by_text(&self, text: &str) -> DriverResult<bool>;
}

/// Page-level primitives of the rendering engine
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Identifier of the underlying tab, stable across handles to it
    fn id(&self) -> String;

    async fn url(&self) -> DriverResult<String>;

    async fn title(&self) -> DriverResult<String>;

    /// False once the tab is gone. A tab that is merely slow to answer counts
    /// as open.
    async fn is_open(&self) -> bool;

    /// Navigate and return the main document's HTTP status when known
    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<Option<u16>>;

    async fn go_back(&self, timeout: Duration) -> DriverResult<()>;

    /// Wait for the document to finish loading and the network to go quiet
    async fn wait_for_load(&self, timeout: Duration) -> DriverResult<()>;

    /// Scan every element matching the interactivity selector
    async fn scan_candidates(&self) -> DriverResult<Vec<RawCandidate>>;

    /// Live handle for a candidate from the most recent scan
    async fn candidate(&self, ordinal: usize) -> DriverResult<Option<Box<dyn ElementHandle>>>;

    async fn query_selector(&self, selector: &str) -> DriverResult<Option<Box<dyn ElementHandle>>>;

    /// Case-insensitive structured text locator
    async fn find_text(&self, needle: &str) -> DriverResult<Option<Box<dyn ElementHandle>>>;

    /// Script scan that scrolls the first visible match into view
    async fn scroll_text_into_view(&self, needle: &str) -> DriverResult<bool>;

    async fn scroll_metrics(&self) -> DriverResult<ScrollMetrics>;

    async fn viewport(&self) -> DriverResult<ViewportSize>;

    async fn scroll_by(&self, dx: f64, dy: f64) -> DriverResult<()>;

    async fn click_at(&self, point: Point) -> DriverResult<()>;

    async fn drag(&self, from: Point, to: Point, steps: u32, step_delay: Duration) -> DriverResult<()>;

    async fn press_key(&self, chord: &KeyChord) -> DriverResult<()>;

    async fn type_char(&self, ch: char) -> DriverResult<()>;

    /// Text of the best-guess main content root with chrome stripped
    async fn extract_main_content(&self) -> DriverResult<String>;

    async fn html(&self) -> DriverResult<String>;

    /// Visible option-like elements, used for custom dropdowns
    async fn visible_options(&self) -> DriverResult<Vec<DropdownOption>>;

    async fn screenshot(&self, options: &ScreenshotOptions) -> DriverResult<Vec<u8>>;

    async fn pdf(&self) -> DriverResult<Vec<u8>>;

    async fn bring_to_front(&self) -> DriverResult<()>;

    async fn close(&self) -> DriverResult<()>;
}

/// A connected browser
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Health check
    async fn is_connected(&self) -> bool;

    async fn pages(&self) -> DriverResult<Vec<Arc<dyn PageDriver>>>;

    async fn new_page(&self, url: &str) -> DriverResult<Arc<dyn PageDriver>>;

    async fn shutdown(&self) -> DriverResult<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> DriverResult<Arc<dyn BrowserDriver>>;
}
