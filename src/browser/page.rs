//! chromiumoxide implementation of [`PageDriver`] and [`ElementHandle`]

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::layout::Point as CdpPoint;
use chromiumoxide::page::{Page, ScreenshotParams};
use chromiumoxide_cdp::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams, DispatchMouseEventType,
    MouseButton,
};
use chromiumoxide_cdp::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide_cdp::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use super::scripts;
use super::{
    DriverError, DriverResult, DropdownOption, ElementHandle, PageDriver, Point, RawCandidate, Rect,
    ScreenshotOptions, ScrollMetrics, ViewportSize,
};
use crate::utils::keys::KeyChord;

/// Bound on single protocol round-trips that have no caller-supplied timeout
const PROTOCOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on the liveness check
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(2);

async fn bounded<T, F>(timeout: Duration, fut: F) -> DriverResult<T>
where
    F: std::future::Future<Output = Result<T, chromiumoxide::error::CdpError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(DriverError::from),
        Err(_) => Err(DriverError::Timeout(timeout)),
    }
}

#[derive(Deserialize)]
struct LoadState {
    ready: bool,
    resources: usize,
}

/// A chromiumoxide tab
#[derive(Clone)]
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval_string(&self, script: &str) -> DriverResult<String> {
        let result = bounded(PROTOCOL_TIMEOUT, self.page.evaluate(script)).await?;
        result
            .into_value::<String>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn eval_json<T: DeserializeOwned>(&self, script: &str) -> DriverResult<T> {
        let raw = self.eval_string(script).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn eval_value<T: DeserializeOwned>(&self, script: &str) -> DriverResult<T> {
        let result = bounded(PROTOCOL_TIMEOUT, self.page.evaluate(script)).await?;
        result
            .into_value::<T>()
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn find(&self, selector: &str) -> Option<Box<dyn ElementHandle>> {
        match bounded(PROTOCOL_TIMEOUT, self.page.find_element(selector)).await {
            Ok(element) => Some(Box::new(ChromiumElement::new(self.page.clone(), element))),
            Err(e) => {
                trace!("No element for selector '{}': {}", selector, e);
                None
            }
        }
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        point: Point,
        pressed: bool,
    ) -> DriverResult<()> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(point.x)
            .y(point.y);
        if pressed {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(DriverError::Protocol)?;
        bounded(PROTOCOL_TIMEOUT, self.page.execute(params)).await?;
        Ok(())
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, chord: &KeyChord) -> DriverResult<()> {
        let key_down = matches!(kind, DispatchKeyEventType::KeyDown);
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(chord.key.clone())
            .modifiers(chord.modifier_flags());
        if key_down
            && let Some(text) = chord.text()
        {
            builder = builder.text(text);
        }
        let params = builder.build().map_err(DriverError::Protocol)?;
        bounded(PROTOCOL_TIMEOUT, self.page.execute(params)).await?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    fn id(&self) -> String {
        self.page.target_id().inner().clone()
    }

    async fn url(&self) -> DriverResult<String> {
        let url = bounded(PROTOCOL_TIMEOUT, self.page.url()).await?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn title(&self) -> DriverResult<String> {
        let title = bounded(PROTOCOL_TIMEOUT, self.page.get_title()).await?;
        Ok(title.unwrap_or_default())
    }

    async fn is_open(&self) -> bool {
        match bounded(LIVENESS_TIMEOUT, self.page.evaluate("document.readyState")).await {
            Ok(_) => true,
            // A heavy navigation can stall evaluation without closing the tab
            Err(DriverError::Timeout(t)) => {
                debug!("Tab {} did not answer within {:?}, keeping it", self.id(), t);
                true
            }
            Err(e) => {
                debug!("Tab {} is gone: {}", self.id(), e);
                false
            }
        }
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> DriverResult<Option<u16>> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(DriverError::NavigationFailed(e.to_string())),
            Err(_) => return Err(DriverError::Timeout(timeout)),
        }

        let status: u16 = self.eval_value(scripts::NAVIGATION_STATUS).await.unwrap_or(0);
        Ok((status != 0).then_some(status))
    }

    async fn go_back(&self, timeout: Duration) -> DriverResult<()> {
        let length: u32 = self.eval_value(scripts::HISTORY_LENGTH).await?;
        if length <= 1 {
            return Err(DriverError::NavigationFailed(
                "No previous page in history".to_string(),
            ));
        }
        bounded(PROTOCOL_TIMEOUT, self.page.evaluate(scripts::HISTORY_BACK)).await?;
        // history.back() resolves before the navigation commits
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.wait_for_load(timeout).await
    }

    async fn wait_for_load(&self, timeout: Duration) -> DriverResult<()> {
        let start = Instant::now();
        let mut poll_interval = Duration::from_millis(100);
        let mut last_resources = None;

        loop {
            if let Ok(state) = self.eval_json::<LoadState>(scripts::LOAD_STATE).await {
                if state.ready && last_resources == Some(state.resources) {
                    return Ok(());
                }
                last_resources = Some(state.resources);
            }

            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout(timeout));
            }
            tokio::time::sleep(poll_interval).await;
            poll_interval = (poll_interval * 2).min(Duration::from_millis(500));
        }
    }

    async fn scan_candidates(&self) -> DriverResult<Vec<RawCandidate>> {
        self.eval_json(&scripts::scan_candidates()).await
    }

    async fn candidate(&self, ordinal: usize) -> DriverResult<Option<Box<dyn ElementHandle>>> {
        Ok(self.find(&scripts::candidate_selector(ordinal)).await)
    }

    async fn query_selector(&self, selector: &str) -> DriverResult<Option<Box<dyn ElementHandle>>> {
        Ok(self.find(selector).await)
    }

    async fn find_text(&self, needle: &str) -> DriverResult<Option<Box<dyn ElementHandle>>> {
        let xpath = scripts::text_xpath(needle);
        match bounded(PROTOCOL_TIMEOUT, self.page.find_xpath(xpath)).await {
            Ok(element) => Ok(Some(Box::new(ChromiumElement::new(self.page.clone(), element)))),
            Err(DriverError::Timeout(t)) => Err(DriverError::Timeout(t)),
            Err(e) => {
                trace!("Text locator found nothing for '{}': {}", needle, e);
                Ok(None)
            }
        }
    }

    async fn scroll_text_into_view(&self, needle: &str) -> DriverResult<bool> {
        self.eval_value(&scripts::scroll_text_into_view(needle)).await
    }

    async fn scroll_metrics(&self) -> DriverResult<ScrollMetrics> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            pixels_above: f64,
            pixels_below: f64,
        }
        let raw: Raw = self.eval_json(scripts::SCROLL_METRICS).await?;
        Ok(ScrollMetrics {
            pixels_above: raw.pixels_above.max(0.0) as u64,
            pixels_below: raw.pixels_below.max(0.0) as u64,
        })
    }

    async fn viewport(&self) -> DriverResult<ViewportSize> {
        self.eval_json(scripts::VIEWPORT).await
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> DriverResult<()> {
        // Parameterized evaluation keeps the amounts out of the script source
        let call = CallFunctionOnParams::builder()
            .function_declaration("(x, y) => window.scrollBy(x, y)")
            .argument(CallArgument::builder().value(json!(dx)).build())
            .argument(CallArgument::builder().value(json!(dy)).build())
            .build()
            .map_err(DriverError::Protocol)?;
        bounded(PROTOCOL_TIMEOUT, self.page.evaluate_function(call)).await?;
        Ok(())
    }

    async fn click_at(&self, point: Point) -> DriverResult<()> {
        bounded(
            PROTOCOL_TIMEOUT,
            self.page.click(CdpPoint {
                x: point.x,
                y: point.y,
            }),
        )
        .await?;
        Ok(())
    }

    async fn drag(&self, from: Point, to: Point, steps: u32, step_delay: Duration) -> DriverResult<()> {
        let steps = steps.max(1);
        self.dispatch_mouse(DispatchMouseEventType::MouseMoved, from, false).await?;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, from, true).await?;

        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            let point = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, point, false).await?;
            if !step_delay.is_zero() {
                tokio::time::sleep(step_delay).await;
            }
        }

        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, to, true).await?;
        debug!("Dragged from ({}, {}) to ({}, {})", from.x, from.y, to.x, to.y);
        Ok(())
    }

    async fn press_key(&self, chord: &KeyChord) -> DriverResult<()> {
        self.dispatch_key(DispatchKeyEventType::KeyDown, chord).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, chord).await
    }

    async fn type_char(&self, ch: char) -> DriverResult<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::Char)
            .text(ch.to_string())
            .build()
            .map_err(DriverError::Protocol)?;
        bounded(PROTOCOL_TIMEOUT, self.page.execute(params)).await?;
        Ok(())
    }

    async fn extract_main_content(&self) -> DriverResult<String> {
        self.eval_string(scripts::EXTRACT_MAIN_CONTENT).await
    }

    async fn html(&self) -> DriverResult<String> {
        bounded(PROTOCOL_TIMEOUT, self.page.content()).await
    }

    async fn visible_options(&self) -> DriverResult<Vec<DropdownOption>> {
        self.eval_json(scripts::VISIBLE_OPTIONS).await
    }

    async fn screenshot(&self, options: &ScreenshotOptions) -> DriverResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(i64::from(options.quality.min(100)))
            .full_page(options.full_page)
            .build();
        bounded(PROTOCOL_TIMEOUT, self.page.screenshot(params)).await
    }

    async fn pdf(&self) -> DriverResult<Vec<u8>> {
        bounded(
            Duration::from_secs(60),
            self.page.pdf(PrintToPdfParams::default()),
        )
        .await
    }

    async fn bring_to_front(&self) -> DriverResult<()> {
        bounded(PROTOCOL_TIMEOUT, self.page.bring_to_front()).await?;
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        bounded(PROTOCOL_TIMEOUT, self.page.clone().close()).await
    }
}

/// A live element resolved on a [`ChromiumPage`]
pub struct ChromiumElement {
    page: Page,
    element: Element,
}

impl ChromiumElement {
    pub fn new(page: Page, element: Element) -> Self {
        Self { page, element }
    }

    async fn call(&self, function: &str) -> DriverResult<Option<serde_json::Value>> {
        let returns = bounded(PROTOCOL_TIMEOUT, self.element.call_js_fn(function, false)).await?;
        Ok(returns.result.value)
    }

    async fn call_json<T: DeserializeOwned>(&self, function: &str) -> DriverResult<T> {
        match self.call(function).await? {
            Some(serde_json::Value::String(raw)) => Ok(serde_json::from_str(&raw)?),
            other => Err(DriverError::Script(format!(
                "expected a JSON string, got {other:?}"
            ))),
        }
    }

    async fn call_bool(&self, function: &str) -> DriverResult<bool> {
        Ok(self
            .call(function)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

#[async_trait]
impl ElementHandle for ChromiumElement {
    async fn click(&self) -> DriverResult<()> {
        self.scroll_into_view().await?;
        let point = bounded(PROTOCOL_TIMEOUT, self.element.clickable_point()).await?;
        bounded(PROTOCOL_TIMEOUT, self.page.click(point)).await?;
        Ok(())
    }

    async fn fill(&self, text: &str) -> DriverResult<()> {
        self.scroll_into_view().await?;
        self.call(scripts::ELEMENT_CLEAR_VALUE).await?;
        bounded(PROTOCOL_TIMEOUT, self.element.type_str(text)).await?;
        Ok(())
    }

    async fn focus(&self) -> DriverResult<()> {
        bounded(PROTOCOL_TIMEOUT, self.element.focus()).await?;
        Ok(())
    }

    async fn scroll_into_view(&self) -> DriverResult<()> {
        // Element::scroll_into_view waits on an IntersectionObserver, which
        // never fires for some overlays
        self.call(scripts::ELEMENT_SCROLL_INTO_VIEW).await?;
        Ok(())
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        self.call_bool(scripts::ELEMENT_IS_VISIBLE).await
    }

    async fn bounding_box(&self) -> DriverResult<Rect> {
        self.call_json(scripts::ELEMENT_BOUNDING_BOX).await
    }

    async fn select_options(&self) -> DriverResult<Vec<DropdownOption>> {
        self.call_json(scripts::ELEMENT_SELECT_OPTIONS).await
    }

    async fn select_option_by_text(&self, text: &str) -> DriverResult<bool> {
        self.call_bool(&scripts::element_select_option_by_text(text))
            .await
    }
}
