//! One-pass interactive element indexing
//!
//! A scan returns every element matching [`INTERACTIVE_SELECTOR`] in document
//! order. Those that pass [`is_interactive_candidate`] receive highlight
//! indices `1..=N` in that order; everything else is dropped. Indices are only
//! meaningful for the [`IndexedDom`] that produced them.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::node::{CoordinateSet, DomTree, ElementData, NodeId};
use crate::browser::{DriverResult, ElementHandle, PageDriver, RawCandidate};

/// Links, buttons, form controls, interactive ARIA roles and focusable elements
pub const INTERACTIVE_SELECTOR: &str = r#"a, button, input, select, textarea, [role="button"], [role="link"], [role="checkbox"], [role="radio"], [tabindex]:not([tabindex="-1"])"#;

/// highlight index -> node in the snapshot's tree
pub type SelectorMap = BTreeMap<u32, NodeId>;

/// Visible, non-zero area, not hidden by CSS, and present in layout
pub fn is_interactive_candidate(candidate: &RawCandidate) -> bool {
    let has_area = candidate
        .viewport_rect
        .or(candidate.page_rect)
        .is_some_and(|rect| rect.has_area());
    let transparent = candidate
        .opacity
        .trim()
        .parse::<f64>()
        .is_ok_and(|opacity| opacity <= 0.0);

    has_area
        && candidate.in_layout
        && candidate.display != "none"
        && candidate.visibility != "hidden"
        && !transparent
}

/// Element tree and selector map from one indexing pass
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDom {
    pub tree: DomTree,
    pub selector_map: SelectorMap,
    /// The pass failed and the map holds only the placeholder element
    pub degraded: bool,
}

fn root_element() -> ElementData {
    ElementData {
        tag_name: "body".to_string(),
        is_visible: true,
        is_top_element: true,
        ..ElementData::default()
    }
}

impl IndexedDom {
    /// Build the tree from a scan, in scan order
    pub fn from_candidates(candidates: &[RawCandidate]) -> Self {
        let mut tree = DomTree::new(root_element());
        let mut selector_map = SelectorMap::new();
        let root = tree.root();

        for candidate in candidates.iter().filter(|c| is_interactive_candidate(c)) {
            let index = selector_map.len() as u32 + 1;
            let element = tree.add_element(
                root,
                ElementData {
                    tag_name: candidate.tag_name.to_lowercase(),
                    attributes: candidate.attributes.clone(),
                    children: Vec::new(),
                    is_visible: true,
                    is_interactive: true,
                    is_top_element: true,
                    is_in_viewport: candidate.in_viewport,
                    highlight_index: Some(index),
                    page_coordinates: candidate.page_rect.map(CoordinateSet::from),
                    viewport_coordinates: candidate.viewport_rect.map(CoordinateSet::from),
                },
            );
            tree.add_text(element, candidate.text.clone(), true);
            selector_map.insert(index, element);
        }

        Self {
            tree,
            selector_map,
            degraded: false,
        }
    }

    /// Single placeholder element so consumers never see an empty map
    pub fn degraded() -> Self {
        let mut tree = DomTree::new(root_element());
        let root = tree.root();
        let placeholder = tree.add_element(
            root,
            ElementData {
                tag_name: "a".to_string(),
                attributes: BTreeMap::from([("href".to_string(), "#".to_string())]),
                is_visible: true,
                is_interactive: true,
                is_top_element: true,
                is_in_viewport: true,
                highlight_index: Some(1),
                ..ElementData::default()
            },
        );
        tree.add_text(placeholder, "Dummy Element", true);

        Self {
            tree,
            selector_map: SelectorMap::from([(1, placeholder)]),
            degraded: true,
        }
    }

    pub fn element_count(&self) -> usize {
        self.selector_map.len()
    }

    pub fn element(&self, index: u32) -> Option<&ElementData> {
        self.tree.element(*self.selector_map.get(&index)?)
    }

    /// Highlight indices with their element nodes, ascending
    pub fn indexed_elements(&self) -> impl Iterator<Item = (u32, NodeId, &ElementData)> {
        self.selector_map
            .iter()
            .filter_map(|(&index, &id)| self.tree.element(id).map(|element| (index, id, element)))
    }
}

/// Index the live page; failures degrade to [`IndexedDom::degraded`]
pub async fn index_page(page: &dyn PageDriver) -> IndexedDom {
    match page.scan_candidates().await {
        Ok(candidates) => {
            let indexed = IndexedDom::from_candidates(&candidates);
            debug!(
                "Indexed {} interactive elements out of {} candidates",
                indexed.element_count(),
                candidates.len()
            );
            indexed
        }
        Err(e) => {
            warn!("Element indexing failed, using placeholder map: {}", e);
            IndexedDom::degraded()
        }
    }
}

/// Live handle for a highlight index, resolved against a fresh scan
pub struct LiveElement {
    pub index: u32,
    pub tag_name: String,
    pub handle: Box<dyn ElementHandle>,
}

/// Re-scan the page and resolve `index` against that same scan.
///
/// `Ok(None)` when the index is outside the freshly computed interactive set.
pub async fn resolve_live(page: &dyn PageDriver, index: u32) -> DriverResult<Option<LiveElement>> {
    if index == 0 {
        return Ok(None);
    }
    let candidates = page.scan_candidates().await?;
    let Some(candidate) = candidates
        .iter()
        .filter(|c| is_interactive_candidate(c))
        .nth(index as usize - 1)
    else {
        return Ok(None);
    };

    Ok(page
        .candidate(candidate.ordinal)
        .await?
        .map(|handle| LiveElement {
            index,
            tag_name: candidate.tag_name.to_lowercase(),
            handle,
        }))
}
