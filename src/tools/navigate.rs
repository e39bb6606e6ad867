//! Navigation actions: load a URL, search, history back, and fixed waits

use tracing::{info, warn};
use url::Url;

use super::AutomationEngine;
use crate::actions::{GoToUrlAction, SearchGoogleAction, WaitAction};
use crate::browser::PageDriver;
use crate::result::{ActionResult, Outcome};
use crate::utils::{EngineError, EngineResult, validate_navigation_timeout, wait_duration};

/// Results URL for `query` on the named search engine
pub(crate) fn search_url(engine: &str, query: &str) -> EngineResult<String> {
    let query = urlencoding::encode(query);
    match engine.to_ascii_lowercase().as_str() {
        "google" => Ok(format!("https://www.google.com/search?q={}", query)),
        "bing" => Ok(format!("https://www.bing.com/search?q={}", query)),
        "duckduckgo" => Ok(format!("https://duckduckgo.com/?q={}", query)),
        other => Err(EngineError::invalid_argument(format!(
            "Unsupported search engine '{}'. Use google, bing or duckduckgo",
            other
        ))),
    }
}

impl AutomationEngine {
    /// Load `url` in the active tab and wait for the page to settle.
    ///
    /// A non-2xx response is logged but the navigation still counts as done.
    pub(super) async fn load(&self, page: &dyn PageDriver, url: &str) -> EngineResult<()> {
        Url::parse(url).map_err(|e| EngineError::invalid_argument(format!("Invalid URL '{}': {}", url, e)))?;
        let timeout = validate_navigation_timeout(self.config.navigation_timeout_ms)?;

        match page.navigate(url, timeout).await? {
            Some(status) if !(200..300).contains(&status) => {
                warn!("Navigation to {} returned HTTP {}", url, status)
            }
            Some(status) => info!("Navigated to {} (HTTP {})", url, status),
            None => info!("Navigated to {}", url),
        }

        self.settle(page, self.config.load_timeout_ms).await;
        Ok(())
    }

    pub async fn navigate_to(&self, params: GoToUrlAction) -> ActionResult {
        self.run("navigate_to", |page| async move {
            self.load(page.as_ref(), &params.url).await?;
            Ok(Outcome::success(format!("Navigated to {}", params.url)))
        })
        .await
    }

    pub async fn search_google(&self, params: SearchGoogleAction) -> ActionResult {
        self.run("search_google", |page| async move {
            let url = search_url(&self.config.search_engine, &params.query)?;
            self.load(page.as_ref(), &url).await?;
            Ok(Outcome::success(format!("Searched for '{}'", params.query)))
        })
        .await
    }

    pub async fn go_back(&self) -> ActionResult {
        self.run("go_back", |page| async move {
            let timeout = validate_navigation_timeout(self.config.navigation_timeout_ms)?;
            page.go_back(timeout).await?;
            self.settle(page.as_ref(), self.config.load_timeout_ms).await;
            Ok(Outcome::success("Navigated back"))
        })
        .await
    }

    pub async fn wait(&self, params: WaitAction) -> ActionResult {
        self.run("wait", |_page| async move {
            let duration = wait_duration(params.seconds);
            tokio::time::sleep(duration).await;
            Ok(Outcome::success(format!(
                "Waited for {:.1} seconds",
                duration.as_secs_f64()
            )))
        })
        .await
    }
}
