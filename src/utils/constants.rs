//! Shared configuration constants for the automation engine
//!
//! Default values and fixed strings used throughout the codebase so the
//! snapshot and action layers agree on placeholders and bounds.

/// Chrome user agent string for launched browsers
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Attribute stamped onto every interactivity candidate during a scan.
///
/// Holds the candidate's ordinal within that scan so a live handle can be
/// re-resolved with `[data-indexed-browser-candidate="N"]`.
pub const CANDIDATE_ATTRIBUTE: &str = "data-indexed-browser-candidate";

/// URL reported when the page URL cannot be read at all
pub const PLACEHOLDER_URL: &str = "unknown";

/// Title reported when the title read fails
pub const PLACEHOLDER_TITLE: &str = "Unknown Title";

/// Title reported when no page could be resolved for a snapshot
pub const ERROR_PAGE_TITLE: &str = "Error page";

/// Listing emitted when a snapshot contains no interactive elements
pub const NO_INTERACTIVE_ELEMENTS: &str = "No interactive elements found";

/// Maximum characters kept per field in the interactive-element summary
pub const SUMMARY_FIELD_MAX_CHARS: usize = 100;

/// Attributes copied into the interactive-element summary
pub const SUMMARY_ATTRIBUTES: &[&str] = &[
    "id",
    "href",
    "src",
    "alt",
    "placeholder",
    "name",
    "role",
    "title",
    "type",
];

/// Attributes always rendered inside a listing line's tag
pub const IDENTIFYING_ATTRIBUTES: &[&str] = &["id", "href", "name", "value", "type"];

/// Default allow-list for attribute values shown when an element has no text
pub const DEFAULT_INCLUDE_ATTRIBUTES: &[&str] = &[
    "id",
    "href",
    "src",
    "alt",
    "aria-label",
    "placeholder",
    "name",
    "role",
    "title",
    "value",
];

/// Default wait for the `wait` action, in seconds
pub const DEFAULT_WAIT_SECONDS: f64 = 3.0;

/// Upper bound for the `wait` action, in seconds
pub const MAX_WAIT_SECONDS: f64 = 60.0;

/// Default number of intermediate pointer moves for drag and drop
pub const DEFAULT_DRAG_STEPS: u32 = 10;

/// Default delay between intermediate drag moves, in milliseconds
pub const DEFAULT_DRAG_DELAY_MS: u64 = 5;

/// Fixed pause after scrolls and dropdown interactions, in milliseconds
pub const SCROLL_SETTLE_MS: u64 = 500;
