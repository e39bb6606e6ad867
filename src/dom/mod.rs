//! Element indexing: live page to numbered interactive-element tree

mod indexer;
mod node;
mod render;

pub use indexer::{
    INTERACTIVE_SELECTOR, IndexedDom, LiveElement, SelectorMap, index_page, is_interactive_candidate,
    resolve_live,
};
pub use node::{CoordinateSet, DomNode, DomTree, ElementData, NodeId, NodeKind, TextData};
pub use render::clickable_elements_to_string;
