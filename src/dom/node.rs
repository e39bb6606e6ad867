//! Arena-backed element tree
//!
//! Nodes live in one `Vec` owned by [`DomTree`]; children and parents are
//! plain [`NodeId`] indices into it. Parent links are only used for upward
//! traversal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::browser::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Page-absolute or viewport-relative box of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateSet {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<Rect> for CoordinateSet {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementData {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<NodeId>,
    pub is_visible: bool,
    pub is_interactive: bool,
    pub is_top_element: bool,
    pub is_in_viewport: bool,
    pub highlight_index: Option<u32>,
    pub page_coordinates: Option<CoordinateSet>,
    pub viewport_coordinates: Option<CoordinateSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Element(ElementData),
    Text(TextData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomTree {
    nodes: Vec<DomNode>,
    root: NodeId,
}

impl DomTree {
    /// Tree with a single root element
    pub fn new(root: ElementData) -> Self {
        Self {
            nodes: vec![DomNode {
                parent: None,
                kind: NodeKind::Element(root),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode {
            parent: Some(parent),
            kind,
        });
        if let Some(DomNode {
            kind: NodeKind::Element(data),
            ..
        }) = self.nodes.get_mut(parent.0)
        {
            data.children.push(id);
        }
        id
    }

    /// Append an element under `parent`
    pub fn add_element(&mut self, parent: NodeId, data: ElementData) -> NodeId {
        self.push(parent, NodeKind::Element(data))
    }

    /// Append a text node under `parent`
    pub fn add_text(&mut self, parent: NodeId, text: impl Into<String>, is_visible: bool) -> NodeId {
        self.push(
            parent,
            NodeKind::Text(TextData {
                text: text.into(),
                is_visible,
            }),
        )
    }

    /// Whether any ancestor of `id` carries a highlight index
    pub fn has_parent_with_highlight_index(&self, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if self
                .element(parent)
                .is_some_and(|e| e.highlight_index.is_some())
            {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Text under `id`, skipping subtrees of highlighted descendants.
    ///
    /// The starting element's own highlight index does not stop the walk;
    /// any other highlighted element does, and the walk resumes with its
    /// next sibling. `max_depth` of `None` is unbounded.
    pub fn all_text_till_next_clickable_element(&self, id: NodeId, max_depth: Option<usize>) -> String {
        let mut texts = Vec::new();
        self.collect_text(id, id, 0, max_depth, &mut texts);
        texts.join("\n").trim().to_string()
    }

    fn collect_text(
        &self,
        start: NodeId,
        id: NodeId,
        depth: usize,
        max_depth: Option<usize>,
        texts: &mut Vec<String>,
    ) {
        if max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => texts.push(text.text.clone()),
            NodeKind::Element(element) => {
                if id != start && element.highlight_index.is_some() {
                    return;
                }
                for &child in &element.children {
                    self.collect_text(start, child, depth + 1, max_depth, texts);
                }
            }
        }
    }

    /// Depth-first pre-order walk from the root
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(element) = self.element(id) {
                stack.extend(element.children.iter().rev().copied());
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, highlight_index: Option<u32>) -> ElementData {
        ElementData {
            tag_name: tag.to_string(),
            is_visible: true,
            highlight_index,
            ..ElementData::default()
        }
    }

    #[test]
    fn children_and_parents_are_linked() {
        let mut tree = DomTree::new(element("body", None));
        let div = tree.add_element(tree.root(), element("div", None));
        let text = tree.add_text(div, "hello", true);

        assert_eq!(tree.parent(text), Some(div));
        assert_eq!(tree.parent(div), Some(tree.root()));
        assert_eq!(tree.element(tree.root()).unwrap().children, vec![div]);
        assert_eq!(tree.walk(), vec![tree.root(), div, text]);
    }

    #[test]
    fn text_aggregation_skips_highlighted_descendants_but_continues_siblings() {
        let mut tree = DomTree::new(element("body", None));
        let form = tree.add_element(tree.root(), element("form", Some(1)));
        tree.add_text(form, "Sign up", true);
        let button = tree.add_element(form, element("button", Some(2)));
        tree.add_text(button, "Submit", true);
        let span = tree.add_element(form, element("span", None));
        tree.add_text(span, "Terms apply", true);

        assert_eq!(
            tree.all_text_till_next_clickable_element(form, None),
            "Sign up\nTerms apply"
        );
        assert_eq!(tree.all_text_till_next_clickable_element(button, None), "Submit");
    }

    #[test]
    fn text_aggregation_respects_max_depth() {
        let mut tree = DomTree::new(element("body", None));
        let outer = tree.add_element(tree.root(), element("div", None));
        tree.add_text(outer, "shallow", true);
        let inner = tree.add_element(outer, element("div", None));
        tree.add_text(inner, "deep", true);

        assert_eq!(tree.all_text_till_next_clickable_element(outer, Some(1)), "shallow");
        assert_eq!(
            tree.all_text_till_next_clickable_element(outer, None),
            "shallow\ndeep"
        );
    }

    #[test]
    fn highlighted_ancestor_is_detected() {
        let mut tree = DomTree::new(element("body", None));
        let link = tree.add_element(tree.root(), element("a", Some(1)));
        let text = tree.add_text(link, "Home", true);
        let loose = tree.add_text(tree.root(), "Footer", true);

        assert!(tree.has_parent_with_highlight_index(text));
        assert!(!tree.has_parent_with_highlight_index(loose));
    }
}
