//! Page-side scripts evaluated by the chromiumoxide driver
//!
//! Every script that returns structured data returns a JSON string so the
//! result survives `Runtime.callFunctionOn` without `returnByValue`.

use crate::dom::INTERACTIVE_SELECTOR;
use crate::utils::constants::CANDIDATE_ATTRIBUTE;

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Scan interactive candidates in document order and stamp each one with its
/// ordinal under [`CANDIDATE_ATTRIBUTE`].
pub fn scan_candidates() -> String {
    format!(
        r#"(() => {{
    const ATTR = {attr};
    document.querySelectorAll('[' + ATTR + ']').forEach(el => el.removeAttribute(ATTR));
    const out = [];
    let ordinal = 0;
    for (const el of document.querySelectorAll({selector})) {{
        const attributes = {{}};
        for (const a of el.attributes) {{
            if (a.name !== ATTR) attributes[a.name] = a.value;
        }}
        el.setAttribute(ATTR, String(ordinal));
        const style = window.getComputedStyle(el);
        const r = el.getBoundingClientRect();
        let value = typeof el.value === 'string' ? el.value : '';
        const text = String(el.innerText || value || el.getAttribute('aria-label') || '').trim();
        out.push({{
            ordinal,
            tagName: el.tagName.toLowerCase(),
            attributes,
            text,
            display: style.display,
            visibility: style.visibility,
            opacity: String(style.opacity),
            inLayout: el.offsetParent !== null || style.position === 'fixed',
            pageRect: {{ x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height }},
            viewportRect: {{ x: r.left, y: r.top, width: r.width, height: r.height }},
            inViewport: r.top >= 0 && r.left >= 0 && r.bottom <= window.innerHeight && r.right <= window.innerWidth,
        }});
        ordinal += 1;
    }}
    return JSON.stringify(out);
}})()"#,
        attr = js_string(CANDIDATE_ATTRIBUTE),
        selector = js_string(INTERACTIVE_SELECTOR),
    )
}

/// CSS selector for a stamped candidate
pub fn candidate_selector(ordinal: usize) -> String {
    format!("[{CANDIDATE_ATTRIBUTE}=\"{ordinal}\"]")
}

pub const SCROLL_METRICS: &str = r#"(() => {
    const scrollY = window.scrollY || window.pageYOffset || 0;
    const total = Math.max(
        document.documentElement ? document.documentElement.scrollHeight : 0,
        document.body ? document.body.scrollHeight : 0
    );
    return JSON.stringify({
        pixelsAbove: Math.round(scrollY),
        pixelsBelow: Math.max(0, Math.round(total - scrollY - window.innerHeight)),
    });
})()"#;

pub const VIEWPORT: &str = r#"JSON.stringify({ width: window.innerWidth, height: window.innerHeight })"#;

pub const LOAD_STATE: &str = r#"JSON.stringify({
    ready: document.readyState === 'complete',
    resources: performance.getEntriesByType('resource').length,
})"#;

pub const NAVIGATION_STATUS: &str = r#"(() => {
    const entry = performance.getEntriesByType('navigation')[0];
    return entry && entry.responseStatus ? entry.responseStatus : 0;
})()"#;

pub const HISTORY_LENGTH: &str = "window.history.length";

pub const HISTORY_BACK: &str = "window.history.back()";

/// Walk text nodes and scroll the first visible case-insensitive match into view
pub fn scroll_text_into_view(needle: &str) -> String {
    format!(
        r#"(() => {{
    const needle = {needle}.toLowerCase();
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT);
    let node;
    while ((node = walker.nextNode())) {{
        if (!node.textContent || !node.textContent.toLowerCase().includes(needle)) continue;
        const el = node.parentElement;
        if (!el) continue;
        const style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden') continue;
        el.scrollIntoView({{ behavior: 'auto', block: 'center' }});
        return true;
    }}
    return false;
}})()"#,
        needle = js_string(needle),
    )
}

pub const EXTRACT_MAIN_CONTENT: &str = r#"(() => {
    const root = document.querySelector('main, article, [role="main"], #main, #content, .main-content, .content') || document.body;
    if (!root) return '';
    const clone = root.cloneNode(true);
    clone.querySelectorAll([
        'script', 'style', 'noscript', 'template', 'nav', 'header', 'footer', 'aside',
        'iframe', 'svg', 'canvas', 'img', 'picture', 'video', 'audio', 'object', 'embed',
        '[role="navigation"]', '[role="banner"]', '[role="contentinfo"]', '[aria-hidden="true"]',
        '.ad', '.ads', '.advert', '.advertisement', '[class*="sponsor"]', '[id^="ad-"]', '[class^="ad-"]'
    ].join(',')).forEach(n => n.remove());
    const BLOCK = new Set(['P', 'DIV', 'SECTION', 'ARTICLE', 'MAIN', 'LI', 'UL', 'OL', 'TR', 'TABLE',
        'H1', 'H2', 'H3', 'H4', 'H5', 'H6', 'BLOCKQUOTE', 'PRE', 'BR', 'HR', 'DT', 'DD', 'FIGCAPTION']);
    const parts = [];
    const walk = (node) => {
        if (node.nodeType === Node.TEXT_NODE) { parts.push(node.textContent); return; }
        if (node.nodeType !== Node.ELEMENT_NODE) return;
        const block = BLOCK.has(node.tagName);
        if (block) parts.push('\n');
        for (const child of node.childNodes) walk(child);
        if (block) parts.push('\n');
    };
    walk(clone);
    return parts.join('');
})()"#;

pub const VISIBLE_OPTIONS: &str = r#"(() => {
    const out = [];
    const seen = new Set();
    document.querySelectorAll('[role="option"], [role="menuitem"], [role="menuitemradio"], [role="listbox"] li, ul[role] li, .dropdown-item').forEach(el => {
        if (seen.has(el)) return;
        seen.add(el);
        const r = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        if (r.width <= 0 || r.height <= 0 || style.display === 'none' || style.visibility === 'hidden') return;
        const text = String(el.innerText || el.textContent || '').trim();
        if (!text) return;
        out.push({ index: out.length, text, value: el.getAttribute('data-value') || el.getAttribute('value') || text });
    });
    return JSON.stringify(out);
})()"#;

pub const ELEMENT_SCROLL_INTO_VIEW: &str =
    "function() { this.scrollIntoView({ behavior: 'auto', block: 'center', inline: 'nearest' }); return true; }";

pub const ELEMENT_CLEAR_VALUE: &str = r#"function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
    } else if (this.isContentEditable) {
        this.textContent = '';
    }
    this.focus();
    return true;
}"#;

pub const ELEMENT_IS_VISIBLE: &str = r#"function() {
    const r = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return r.width > 0 && r.height > 0 && style.display !== 'none' && style.visibility !== 'hidden'
        && r.bottom > 0 && r.right > 0 && r.top < window.innerHeight && r.left < window.innerWidth;
}"#;

pub const ELEMENT_BOUNDING_BOX: &str = r#"function() {
    const r = this.getBoundingClientRect();
    return JSON.stringify({ x: r.left, y: r.top, width: r.width, height: r.height });
}"#;

pub const ELEMENT_SELECT_OPTIONS: &str = r#"function() {
    if (!this.options) return JSON.stringify([]);
    return JSON.stringify(Array.from(this.options).map((o, index) => ({
        index, text: String(o.text || '').trim(), value: String(o.value || ''),
    })));
}"#;

pub fn element_select_option_by_text(text: &str) -> String {
    format!(
        r#"function() {{
    const wanted = {wanted};
    if (!this.options) return false;
    const options = Array.from(this.options);
    const match = options.find(o => String(o.text || '').trim() === wanted)
        || options.find(o => String(o.text || '').trim().toLowerCase() === wanted.toLowerCase());
    if (!match) return false;
    this.value = match.value;
    match.selected = true;
    this.dispatchEvent(new Event('input', {{ bubbles: true }}));
    this.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}}"#,
        wanted = js_string(text.trim()),
    )
}

/// XPath string literal for arbitrary text, using `concat()` when the text
/// contains both quote kinds.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Case-insensitive XPath locating the innermost visible-text holder of `needle`.
///
/// `translate()` only folds ASCII letters; other scripts match case-sensitively.
pub fn text_xpath(needle: &str) -> String {
    const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
    let lowered = xpath_literal(&needle.to_ascii_lowercase());
    format!(
        "//body//*[not(self::script) and not(self::style) and not(self::noscript)]\
         [text()[contains(translate(., '{UPPER}', '{LOWER}'), {lowered})]]"
    )
}
