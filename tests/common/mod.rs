//! In-memory browser used by the integration tests.
//!
//! A [`World`] holds the "web" (URL -> page fixture), failure switches and an
//! event log. Pages render their fixture elements as a single column, each
//! element at a fixed document `y`, inside a 1280x720 viewport.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use indexed_browser::browser::{
    BrowserDriver, BrowserLauncher, DriverError, DriverResult, DropdownOption, ElementHandle,
    PageDriver, Point, RawCandidate, Rect, ScreenshotOptions, ScrollMetrics, ViewportSize,
};
use indexed_browser::ocr::{OcrEngine, OcrError};
use indexed_browser::{AutomationEngine, EngineConfig, KeyChord};

pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 720;
const ELEMENT_HEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub visible: bool,
    /// Matched by the interactivity selector
    pub interactive: bool,
    /// Only visible while a custom dropdown is open
    pub shown_when_open: bool,
    /// Clicking opens the custom dropdown
    pub opens_dropdown: bool,
    pub y: f64,
    pub options: Vec<(String, String)>,
    pub fails_on_click: bool,
}

impl FakeElement {
    fn new(tag: &str, text: &str, interactive: bool) -> Self {
        Self {
            tag: tag.to_string(),
            text: text.to_string(),
            visible: true,
            interactive,
            ..Self::default()
        }
    }

    pub fn button(text: &str) -> Self {
        Self::new("button", text, true)
    }

    pub fn link(text: &str, href: &str) -> Self {
        Self::new("a", text, true).attr("href", href)
    }

    pub fn input(name: &str) -> Self {
        Self::new("input", "", true).attr("name", name).attr("type", "text")
    }

    pub fn select(options: &[(&str, &str)]) -> Self {
        let mut element = Self::new("select", "", true);
        element.options = options
            .iter()
            .map(|(text, value)| (text.to_string(), value.to_string()))
            .collect();
        element
    }

    /// Non-interactive text block
    pub fn text(text: &str) -> Self {
        Self::new("p", text, false)
    }

    /// `[role=button]` that opens a custom dropdown
    pub fn custom_dropdown(text: &str) -> Self {
        let mut element = Self::new("div", text, true).attr("role", "button");
        element.opens_dropdown = true;
        element
    }

    /// Option of a custom dropdown, hidden until it opens
    pub fn custom_option(text: &str) -> Self {
        let mut element = Self::new("li", text, false).attr("role", "option");
        element.visible = false;
        element.shown_when_open = true;
        element
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn at(mut self, y: f64) -> Self {
        self.y = y;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fails_on_click = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageFixture {
    pub title: String,
    pub elements: Vec<FakeElement>,
    /// Main-content text returned by extraction
    pub content: String,
    pub html: String,
}

impl PageFixture {
    pub fn new(title: &str, elements: Vec<FakeElement>) -> Self {
        let mut elements = elements;
        // Stack elements without an explicit position
        let mut next_y = 10.0;
        for element in &mut elements {
            if element.y == 0.0 {
                element.y = next_y;
            }
            next_y = element.y + ELEMENT_HEIGHT + 10.0;
        }
        Self {
            title: title.to_string(),
            elements,
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }
}

#[derive(Default)]
pub struct World {
    pub site: HashMap<String, PageFixture>,
    pub events: Vec<String>,
    pub navigations: Vec<String>,
    pub launches: usize,
    pub connected: bool,
    pub fail_launch: bool,
    pub fail_scan: bool,
    pub fail_title: bool,
    pub fail_screenshot: bool,
    /// Text locator calls that fail before it starts answering
    pub text_locator_failures: usize,
    pub pages: Vec<Arc<FakePage>>,
}

pub type SharedWorld = Arc<Mutex<World>>;

pub fn world() -> SharedWorld {
    Arc::new(Mutex::new(World::default()))
}

pub fn add_page(world: &SharedWorld, url: &str, fixture: PageFixture) {
    world.lock().unwrap().site.insert(url.to_string(), fixture);
}

pub fn events(world: &SharedWorld) -> Vec<String> {
    world.lock().unwrap().events.clone()
}

pub fn navigations(world: &SharedWorld) -> Vec<String> {
    world.lock().unwrap().navigations.clone()
}

#[derive(Debug, Default)]
struct PageState {
    url: String,
    title: String,
    elements: Vec<FakeElement>,
    content: String,
    html: String,
    history: Vec<String>,
    scroll_y: f64,
    open: bool,
    dropdown_open: bool,
    liveness_misses: usize,
}

impl PageState {
    fn load(&mut self, world: &mut World, url: &str) -> bool {
        let fixture = world.site.get(url).cloned();
        let found = fixture.is_some() || url == "about:blank";
        let fixture = fixture.unwrap_or_default();
        self.url = url.to_string();
        self.title = fixture.title;
        self.elements = fixture.elements;
        self.content = fixture.content;
        self.html = fixture.html;
        self.scroll_y = 0.0;
        self.dropdown_open = false;
        self.history.push(url.to_string());
        world.navigations.push(url.to_string());
        found
    }

    fn is_visible(&self, element: &FakeElement) -> bool {
        element.visible || (element.shown_when_open && self.dropdown_open)
    }

    fn document_height(&self) -> f64 {
        let content = self
            .elements
            .iter()
            .map(|e| e.y + ELEMENT_HEIGHT)
            .fold(0.0, f64::max);
        content.max(f64::from(VIEWPORT_HEIGHT))
    }

    fn scroll_to(&mut self, y: f64) {
        let max = self.document_height() - f64::from(VIEWPORT_HEIGHT);
        self.scroll_y = y.clamp(0.0, max.max(0.0));
    }

    fn find_text(&self, needle: &str) -> Option<usize> {
        let needle = needle.to_lowercase();
        self.elements
            .iter()
            .position(|e| e.text.to_lowercase().contains(&needle))
    }
}

static NEXT_PAGE_ID: AtomicUsize = AtomicUsize::new(1);

pub struct FakePage {
    id: String,
    world: SharedWorld,
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    fn new(world: SharedWorld, url: &str) -> Arc<Self> {
        let page = Arc::new(Self {
            id: format!("tab-{}", NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed)),
            world: world.clone(),
            state: Arc::new(Mutex::new(PageState {
                open: true,
                ..PageState::default()
            })),
        });
        {
            let mut world = world.lock().unwrap();
            page.state.lock().unwrap().load(&mut world, url);
        }
        page
    }

    /// Close the tab behind the engine's back
    pub fn close_externally(&self) {
        self.state.lock().unwrap().open = false;
    }

    /// Fail the next `times` liveness checks while the tab stays open
    pub fn stall(&self, times: usize) {
        self.state.lock().unwrap().liveness_misses = times;
    }

    pub fn current_url(&self) -> String {
        self.state.lock().unwrap().url.clone()
    }

    pub fn field_value(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .elements
            .iter()
            .find(|e| e.attributes.get("name").map(String::as_str) == Some(name))
            .and_then(|e| e.attributes.get("value").cloned())
    }

    fn log(&self, event: String) {
        self.world.lock().unwrap().events.push(event);
    }

    fn handle(&self, ordinal: usize) -> Box<dyn ElementHandle> {
        Box::new(FakeHandle {
            world: self.world.clone(),
            state: self.state.clone(),
            ordinal,
        })
    }

    fn check_open(&self) -> DriverResult<()> {
        if self.state.lock().unwrap().open {
            Ok(())
        } else {
            Err(DriverError::PageClosed)
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn url(&self) -> DriverResult<String> {
        self.check_open()?;
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn title(&self) -> DriverResult<String> {
        self.check_open()?;
        if self.world.lock().unwrap().fail_title {
            return Err(DriverError::Script("title unavailable".to_string()));
        }
        Ok(self.state.lock().unwrap().title.clone())
    }

    async fn is_open(&self) -> bool {
        let connected = self.world.lock().unwrap().connected;
        let mut state = self.state.lock().unwrap();
        if state.liveness_misses > 0 {
            state.liveness_misses -= 1;
            return false;
        }
        connected && state.open
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> DriverResult<Option<u16>> {
        self.check_open()?;
        let mut world = self.world.lock().unwrap();
        let found = self.state.lock().unwrap().load(&mut world, url);
        Ok(Some(if found { 200 } else { 404 }))
    }

    async fn go_back(&self, _timeout: Duration) -> DriverResult<()> {
        self.check_open()?;
        let mut world = self.world.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        if state.history.len() <= 1 {
            return Err(DriverError::NavigationFailed("no previous page in history".to_string()));
        }
        state.history.pop();
        let previous = state.history.pop().unwrap_or_default();
        state.load(&mut world, &previous);
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> DriverResult<()> {
        self.check_open()
    }

    async fn scan_candidates(&self) -> DriverResult<Vec<RawCandidate>> {
        self.check_open()?;
        if self.world.lock().unwrap().fail_scan {
            return Err(DriverError::Script("scan script threw".to_string()));
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.interactive)
            .map(|(ordinal, e)| {
                let visible = state.is_visible(e);
                let viewport_y = e.y - state.scroll_y;
                RawCandidate {
                    ordinal,
                    tag_name: e.tag.to_uppercase(),
                    attributes: e.attributes.clone(),
                    text: e.text.clone(),
                    display: if visible { "block" } else { "none" }.to_string(),
                    visibility: "visible".to_string(),
                    opacity: "1".to_string(),
                    in_layout: visible,
                    page_rect: Some(Rect {
                        x: 10.0,
                        y: e.y,
                        width: 100.0,
                        height: ELEMENT_HEIGHT,
                    }),
                    viewport_rect: Some(Rect {
                        x: 10.0,
                        y: viewport_y,
                        width: 100.0,
                        height: ELEMENT_HEIGHT,
                    }),
                    in_viewport: viewport_y >= 0.0 && viewport_y < f64::from(VIEWPORT_HEIGHT),
                }
            })
            .collect())
    }

    async fn candidate(&self, ordinal: usize) -> DriverResult<Option<Box<dyn ElementHandle>>> {
        self.check_open()?;
        let exists = ordinal < self.state.lock().unwrap().elements.len();
        Ok(exists.then(|| self.handle(ordinal)))
    }

    async fn query_selector(&self, selector: &str) -> DriverResult<Option<Box<dyn ElementHandle>>> {
        self.check_open()?;
        let id = selector.trim_start_matches('#');
        let position = self
            .state
            .lock()
            .unwrap()
            .elements
            .iter()
            .position(|e| e.attributes.get("id").map(String::as_str) == Some(id));
        Ok(position.map(|ordinal| self.handle(ordinal)))
    }

    async fn find_text(&self, needle: &str) -> DriverResult<Option<Box<dyn ElementHandle>>> {
        self.check_open()?;
        {
            let mut world = self.world.lock().unwrap();
            if world.text_locator_failures > 0 {
                world.text_locator_failures -= 1;
                return Err(DriverError::Script("locator unavailable".to_string()));
            }
        }
        let position = self.state.lock().unwrap().find_text(needle);
        Ok(position.map(|ordinal| self.handle(ordinal)))
    }

    async fn scroll_text_into_view(&self, needle: &str) -> DriverResult<bool> {
        self.check_open()?;
        let mut state = self.state.lock().unwrap();
        // The in-page scan skips display:none and visibility:hidden matches
        let needle = needle.to_lowercase();
        let position = state
            .elements
            .iter()
            .position(|e| state.is_visible(e) && e.text.to_lowercase().contains(&needle));
        match position {
            Some(position) => {
                let y = state.elements[position].y;
                state.scroll_to(y);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scroll_metrics(&self) -> DriverResult<ScrollMetrics> {
        self.check_open()?;
        let state = self.state.lock().unwrap();
        let below = state.document_height() - state.scroll_y - f64::from(VIEWPORT_HEIGHT);
        Ok(ScrollMetrics {
            pixels_above: state.scroll_y as u64,
            pixels_below: below.max(0.0) as u64,
        })
    }

    async fn viewport(&self) -> DriverResult<ViewportSize> {
        self.check_open()?;
        Ok(ViewportSize {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        })
    }

    async fn scroll_by(&self, _dx: f64, dy: f64) -> DriverResult<()> {
        self.check_open()?;
        let mut state = self.state.lock().unwrap();
        let y = state.scroll_y + dy;
        state.scroll_to(y);
        Ok(())
    }

    async fn click_at(&self, point: Point) -> DriverResult<()> {
        self.check_open()?;
        self.log(format!("click_at:{},{}", point.x, point.y));
        Ok(())
    }

    async fn drag(&self, from: Point, to: Point, steps: u32, _step_delay: Duration) -> DriverResult<()> {
        self.check_open()?;
        self.log(format!(
            "drag:({},{})->({},{}) in {}",
            from.x, from.y, to.x, to.y, steps
        ));
        Ok(())
    }

    async fn press_key(&self, chord: &KeyChord) -> DriverResult<()> {
        self.check_open()?;
        self.log(format!("key:{}:{}", chord.key, chord.modifier_flags()));
        Ok(())
    }

    async fn type_char(&self, ch: char) -> DriverResult<()> {
        self.check_open()?;
        self.log(format!("type:{}", ch));
        Ok(())
    }

    async fn extract_main_content(&self) -> DriverResult<String> {
        self.check_open()?;
        Ok(self.state.lock().unwrap().content.clone())
    }

    async fn html(&self) -> DriverResult<String> {
        self.check_open()?;
        Ok(self.state.lock().unwrap().html.clone())
    }

    async fn visible_options(&self) -> DriverResult<Vec<DropdownOption>> {
        self.check_open()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .elements
            .iter()
            .filter(|e| e.attributes.get("role").map(String::as_str) == Some("option"))
            .filter(|e| state.is_visible(e))
            .enumerate()
            .map(|(index, e)| DropdownOption {
                index,
                text: e.text.clone(),
                value: e.text.clone(),
            })
            .collect())
    }

    async fn screenshot(&self, _options: &ScreenshotOptions) -> DriverResult<Vec<u8>> {
        self.check_open()?;
        if self.world.lock().unwrap().fail_screenshot {
            return Err(DriverError::Timeout(Duration::from_secs(10)));
        }
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
    }

    async fn pdf(&self) -> DriverResult<Vec<u8>> {
        self.check_open()?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    async fn bring_to_front(&self) -> DriverResult<()> {
        self.check_open()
    }

    async fn close(&self) -> DriverResult<()> {
        self.state.lock().unwrap().open = false;
        Ok(())
    }
}

struct FakeHandle {
    world: SharedWorld,
    state: Arc<Mutex<PageState>>,
    ordinal: usize,
}

impl FakeHandle {
    fn element(&self) -> DriverResult<FakeElement> {
        self.state
            .lock()
            .unwrap()
            .elements
            .get(self.ordinal)
            .cloned()
            .ok_or_else(|| DriverError::Script("element detached".to_string()))
    }

    fn log(&self, event: String) {
        self.world.lock().unwrap().events.push(event);
    }
}

#[async_trait]
impl ElementHandle for FakeHandle {
    async fn click(&self) -> DriverResult<()> {
        let element = self.element()?;
        if element.fails_on_click {
            return Err(DriverError::Protocol("click intercepted by overlay".to_string()));
        }
        self.log(format!("click:{}", element.text));

        if element.opens_dropdown {
            self.state.lock().unwrap().dropdown_open = true;
        }
        if let Some(href) = element.attributes.get("href") {
            let mut world = self.world.lock().unwrap();
            self.state.lock().unwrap().load(&mut world, href);
        }
        Ok(())
    }

    async fn fill(&self, text: &str) -> DriverResult<()> {
        self.element()?;
        self.log(format!("fill:{}", text));
        let mut state = self.state.lock().unwrap();
        state.elements[self.ordinal]
            .attributes
            .insert("value".to_string(), text.to_string());
        Ok(())
    }

    async fn focus(&self) -> DriverResult<()> {
        self.element().map(|_| ())
    }

    async fn scroll_into_view(&self) -> DriverResult<()> {
        let element = self.element()?;
        self.state.lock().unwrap().scroll_to(element.y);
        Ok(())
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        let element = self.element()?;
        Ok(self.state.lock().unwrap().is_visible(&element))
    }

    async fn bounding_box(&self) -> DriverResult<Rect> {
        let element = self.element()?;
        let scroll_y = self.state.lock().unwrap().scroll_y;
        Ok(Rect {
            x: 10.0,
            y: element.y - scroll_y,
            width: 100.0,
            height: ELEMENT_HEIGHT,
        })
    }

    async fn select_options(&self) -> DriverResult<Vec<DropdownOption>> {
        let element = self.element()?;
        Ok(element
            .options
            .iter()
            .enumerate()
            .map(|(index, (text, value))| DropdownOption {
                index,
                text: text.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn select_option_by_text(&self, text: &str) -> DriverResult<bool> {
        let element = self.element()?;
        let Some((label, value)) = element
            .options
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(text.trim()))
            .cloned()
        else {
            return Ok(false);
        };
        self.log(format!("select:{}", label));
        let mut state = self.state.lock().unwrap();
        state.elements[self.ordinal]
            .attributes
            .insert("value".to_string(), value);
        Ok(true)
    }
}

pub struct FakeBrowser {
    world: SharedWorld,
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn is_connected(&self) -> bool {
        self.world.lock().unwrap().connected
    }

    async fn pages(&self) -> DriverResult<Vec<Arc<dyn PageDriver>>> {
        let pages = self.world.lock().unwrap().pages.clone();
        Ok(pages
            .into_iter()
            .filter(|p| p.state.lock().unwrap().open)
            .map(|p| p as Arc<dyn PageDriver>)
            .collect())
    }

    async fn new_page(&self, url: &str) -> DriverResult<Arc<dyn PageDriver>> {
        let page = FakePage::new(self.world.clone(), url);
        self.world.lock().unwrap().pages.push(page.clone());
        Ok(page)
    }

    async fn shutdown(&self) -> DriverResult<()> {
        let mut world = self.world.lock().unwrap();
        world.connected = false;
        for page in &world.pages {
            page.state.lock().unwrap().open = false;
        }
        Ok(())
    }
}

pub struct FakeLauncher {
    world: SharedWorld,
}

impl FakeLauncher {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> DriverResult<Arc<dyn BrowserDriver>> {
        {
            let mut world = self.world.lock().unwrap();
            if world.fail_launch {
                return Err(DriverError::LaunchFailed("no browser executable".to_string()));
            }
            world.launches += 1;
            world.connected = true;
            world.pages.clear();
        }
        let page = FakePage::new(self.world.clone(), "about:blank");
        self.world.lock().unwrap().pages.push(page);
        Ok(Arc::new(FakeBrowser {
            world: self.world.clone(),
        }))
    }
}

/// OCR that reports the size of the image it was given
pub struct FakeOcr;

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        Ok(format!("ocr:{} bytes", image.len()))
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        settle_delay_ms: 0,
        navigation_timeout_ms: 1_000,
        load_timeout_ms: 100,
        action_settle_timeout_ms: 100,
        fallback_delay_ms: 0,
        screenshot_settle_timeout_ms: 100,
        typing_delay_ms: 0,
        ..EngineConfig::default()
    }
}

pub fn engine_with(world: &SharedWorld, config: EngineConfig) -> AutomationEngine {
    AutomationEngine::new(
        config,
        Arc::new(FakeLauncher::new(world.clone())),
        Arc::new(FakeOcr),
    )
}

pub fn engine(world: &SharedWorld) -> AutomationEngine {
    engine_with(world, test_config())
}

/// Pages still open, in creation order
pub fn open_pages(world: &SharedWorld) -> Vec<Arc<FakePage>> {
    world
        .lock()
        .unwrap()
        .pages
        .iter()
        .filter(|p| p.state.lock().unwrap().open)
        .cloned()
        .collect()
}
