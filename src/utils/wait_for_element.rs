//! Text polling utility for pages that render late
//!
//! Provides wait_for_visible_text() which polls for visible text with
//! exponential backoff. Used after the script fallback of `scroll_to_text`,
//! where the scroll may trigger lazy rendering before the text shows up.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::browser::PageDriver;

/// Wait until `needle` is located and visible, with exponential backoff
///
/// # Polling Strategy
/// - Starts at 100ms intervals
/// - Doubles each retry (exponential backoff)
/// - Caps at 1 second maximum interval
/// - Total duration limited by timeout parameter
///
/// Locator errors count as "not yet visible".
pub async fn wait_for_visible_text(page: &dyn PageDriver, needle: &str, timeout: Duration) -> bool {
    let start = Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        match page.find_text(needle).await {
            Ok(Some(element)) => {
                if element.is_visible().await.unwrap_or(false) {
                    return true;
                }
            }
            Ok(None) => {}
            Err(e) => debug!("Text locator failed while polling for '{}': {}", needle, e),
        }

        if start.elapsed() >= timeout {
            return false;
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(max_interval);
    }
}
