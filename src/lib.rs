//! Indexed browser automation engine
//!
//! Drives a Chromium instance via chromiumoxide, numbers the interactive
//! elements of the current page, and executes actions addressed by those
//! numbers. Every action returns an [`ActionResult`] carrying a fresh view of
//! the page: element listing, screenshot, OCR text and scroll position.

pub mod actions;
pub mod browser;
pub mod browser_setup;
pub mod dom;
mod manager;
pub mod ocr;
mod result;
pub mod server;
pub mod snapshot;
pub mod tabs;
mod tools;
mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable naming the YAML config file
pub const CONFIG_ENV_VAR: &str = "INDEXED_BROWSER_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

/// Timing and output settings of the action executor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pause before every snapshot so reflow and animations finish
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Bound for the load-state wait after navigation
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Bound for the load-state wait after clicks, typing and drags
    #[serde(default = "default_action_settle_timeout_ms")]
    pub action_settle_timeout_ms: u64,

    /// Fixed sleep used when a settle wait times out
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,

    #[serde(default = "default_screenshot_settle_timeout_ms")]
    pub screenshot_settle_timeout_ms: u64,

    /// JPEG quality, 0-100
    #[serde(default = "default_screenshot_quality")]
    pub screenshot_quality: u8,

    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Where `save_pdf` writes its files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// google, bing or duckduckgo
    #[serde(default = "default_search_engine")]
    pub search_engine: String,

    /// Attributes shown for elements without visible text
    #[serde(default = "default_include_attributes")]
    pub include_attributes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_enabled")]
    pub enabled: bool,

    #[serde(default = "default_ocr_command")]
    pub command: String,

    #[serde(default = "default_ocr_language")]
    pub language: String,

    #[serde(default = "default_ocr_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8003
}

fn default_headless() -> bool {
    true
}

fn default_disable_security() -> bool {
    false // SECURE BY DEFAULT
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_settle_delay_ms() -> u64 {
    500
}
fn default_navigation_timeout_ms() -> u64 {
    30_000
}
fn default_load_timeout_ms() -> u64 {
    10_000
}
fn default_action_settle_timeout_ms() -> u64 {
    5_000
}
fn default_fallback_delay_ms() -> u64 {
    1_000
}
fn default_screenshot_settle_timeout_ms() -> u64 {
    3_000
}
fn default_screenshot_quality() -> u8 {
    60
}
fn default_typing_delay_ms() -> u64 {
    20
}
fn default_start_url() -> String {
    "about:blank".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./workspace")
}
fn default_search_engine() -> String {
    "google".to_string()
}
fn default_include_attributes() -> Vec<String> {
    utils::constants::DEFAULT_INCLUDE_ATTRIBUTES
        .iter()
        .map(|a| a.to_string())
        .collect()
}

fn default_ocr_enabled() -> bool {
    true
}
fn default_ocr_command() -> String {
    "tesseract".to_string()
}
fn default_ocr_language() -> String {
    "eng".to_string()
}
fn default_ocr_timeout_ms() -> u64 {
    15_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            action_settle_timeout_ms: default_action_settle_timeout_ms(),
            fallback_delay_ms: default_fallback_delay_ms(),
            screenshot_settle_timeout_ms: default_screenshot_settle_timeout_ms(),
            screenshot_quality: default_screenshot_quality(),
            typing_delay_ms: default_typing_delay_ms(),
            start_url: default_start_url(),
            output_dir: default_output_dir(),
            search_engine: default_search_engine(),
            include_attributes: default_include_attributes(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: default_ocr_enabled(),
            command: default_ocr_command(),
            language: default_ocr_language(),
            timeout_ms: default_ocr_timeout_ms(),
        }
    }
}

/// Load config from `$INDEXED_BROWSER_CONFIG`, else `./config.yaml`, else defaults
pub fn load_yaml_config() -> anyhow::Result<Config> {
    let config_path = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from("config.yaml"),
    };

    if config_path.exists() {
        let contents = fs::read_to_string(&config_path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

pub use browser::{
    BrowserDriver, BrowserLauncher, BrowserWrapper, ChromiumBrowser, ChromiumLauncher, DriverError,
    DriverResult, ElementHandle, PageDriver,
};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use manager::{SessionError, SessionManager};
pub use result::{ActionResult, Outcome};
pub use server::{router, start_server};
pub use tools::{AutomationEngine, HealthStatus};
pub use utils::keys::{KeyChord, KeyInput, Modifier};
pub use utils::{EngineError, EngineResult};
