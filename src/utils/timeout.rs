//! Timeout and duration validation for engine operations

use std::time::Duration;

use super::constants::{DEFAULT_WAIT_SECONDS, MAX_WAIT_SECONDS};
use super::errors::{EngineError, EngineResult};

/// Maximum timeout for browser navigation operations (5 minutes)
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000;

/// Maximum timeout for settle waits after an interaction (30 seconds)
pub const MAX_INTERACTION_TIMEOUT_MS: u64 = 30_000;

/// Validate timeout for navigation operations (navigate, search, go_back)
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(EngineError)` - If timeout exceeds MAX_NAVIGATION_TIMEOUT_MS
pub fn validate_navigation_timeout(timeout_ms: u64) -> EngineResult<Duration> {
    if timeout_ms > MAX_NAVIGATION_TIMEOUT_MS {
        return Err(EngineError::invalid_argument(format!(
            "Timeout cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            timeout_ms,
            timeout_ms as f64 / 60_000.0
        )));
    }

    Ok(Duration::from_millis(timeout_ms))
}

/// Clamp a settle timeout into `0..=MAX_INTERACTION_TIMEOUT_MS`.
///
/// Settle waits are best-effort, so an oversized value is clamped rather than
/// rejected.
pub fn interaction_timeout(timeout_ms: u64) -> Duration {
    Duration::from_millis(timeout_ms.min(MAX_INTERACTION_TIMEOUT_MS))
}

/// Resolve the duration of a `wait` action.
///
/// Missing, negative and non-finite values fall back to sane bounds so the
/// action can never block indefinitely.
pub fn wait_duration(seconds: Option<f64>) -> Duration {
    let seconds = seconds.unwrap_or(DEFAULT_WAIT_SECONDS);
    let seconds = if seconds.is_finite() {
        seconds.clamp(0.0, MAX_WAIT_SECONDS)
    } else {
        DEFAULT_WAIT_SECONDS
    };
    Duration::from_secs_f64(seconds)
}
