use super::node::{DomTree, ElementData, NodeKind};
use crate::utils::constants::{IDENTIFYING_ATTRIBUTES, NO_INTERACTIVE_ELEMENTS};

/// Render indexed elements as `[index]<tag attr="v"> text </>` lines.
///
/// Visible text without a highlighted ancestor is emitted verbatim. An
/// empty rendering becomes [`NO_INTERACTIVE_ELEMENTS`].
pub fn clickable_elements_to_string(tree: &DomTree, include_attributes: &[String]) -> String {
    let mut lines = Vec::new();

    for id in tree.walk() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        match &node.kind {
            NodeKind::Element(element) => {
                if let Some(index) = element.highlight_index {
                    let text = tree.all_text_till_next_clickable_element(id, None);
                    lines.push(element_line(index, element, &text, include_attributes));
                }
            }
            NodeKind::Text(text) => {
                if text.is_visible
                    && !text.text.trim().is_empty()
                    && !tree.has_parent_with_highlight_index(id)
                {
                    lines.push(text.text.clone());
                }
            }
        }
    }

    let rendered = lines.join("\n");
    if rendered.trim().is_empty() {
        NO_INTERACTIVE_ELEMENTS.to_string()
    } else {
        rendered
    }
}

fn element_line(index: u32, element: &ElementData, text: &str, include_attributes: &[String]) -> String {
    let represented = |value: &str| !text.is_empty() && text.contains(value);

    let mut line = format!("[{index}]<{}", element.tag_name);
    for name in IDENTIFYING_ATTRIBUTES {
        if let Some(value) = element.attributes.get(*name)
            && !value.is_empty()
            && !represented(value)
        {
            line.push_str(&format!(" {name}=\"{value}\""));
        }
    }

    if !text.is_empty() {
        line.push_str(&format!("> {text}"));
    } else {
        let fallback: Vec<&str> = include_attributes
            .iter()
            .filter_map(|name| element.attributes.get(name))
            .map(String::as_str)
            .filter(|value| !value.is_empty() && *value != element.tag_name && !represented(value))
            .collect();
        if fallback.is_empty() {
            line.push_str(&format!("> {}", element.tag_name.to_uppercase()));
        } else {
            line.push_str(&format!("> {}", fallback.join(";")));
        }
    }

    line.push_str(" </>");
    line
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::dom::node::ElementData;

    fn include() -> Vec<String> {
        crate::utils::constants::DEFAULT_INCLUDE_ATTRIBUTES
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn indexed(tag: &str, index: u32, attributes: &[(&str, &str)]) -> ElementData {
        ElementData {
            tag_name: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            is_visible: true,
            is_interactive: true,
            highlight_index: Some(index),
            ..ElementData::default()
        }
    }

    fn body() -> ElementData {
        ElementData {
            tag_name: "body".to_string(),
            is_visible: true,
            ..ElementData::default()
        }
    }

    #[test]
    fn empty_tree_renders_fallback_string() {
        let tree = DomTree::new(body());
        assert_eq!(clickable_elements_to_string(&tree, &include()), "No interactive elements found");
    }

    #[test]
    fn lines_carry_identifying_attributes_and_text() {
        let mut tree = DomTree::new(body());
        let root = tree.root();
        let link = tree.add_element(root, indexed("a", 1, &[("href", "/docs"), ("class", "nav")]));
        tree.add_text(link, "Docs", true);
        let input = tree.add_element(
            root,
            indexed("input", 2, &[("name", "q"), ("type", "search"), ("value", "rust")]),
        );
        tree.add_text(input, "rust", true);

        assert_eq!(
            clickable_elements_to_string(&tree, &include()),
            "[1]<a href=\"/docs\"> Docs </>\n[2]<input name=\"q\" type=\"search\"> rust </>"
        );
    }

    #[test]
    fn textless_elements_fall_back_to_attributes_then_tag() {
        let mut tree = DomTree::new(body());
        let root = tree.root();
        let image_link = tree.add_element(root, indexed("a", 1, &[("title", "Home"), ("aria-label", "Go home")]));
        tree.add_text(image_link, "", true);
        let bare = tree.add_element(root, indexed("button", 2, &[("role", "switch")]));
        tree.add_text(bare, "", true);

        assert_eq!(
            clickable_elements_to_string(&tree, &include()),
            "[1]<a> Go home;Home </>\n[2]<button> switch </>"
        );
    }

    #[test]
    fn tag_name_is_uppercased_when_nothing_else_is_available() {
        let mut tree = DomTree::new(body());
        let root = tree.root();
        let select = tree.add_element(root, indexed("select", 1, &[]));
        tree.add_text(select, "", true);

        assert_eq!(clickable_elements_to_string(&tree, &include()), "[1]<select> SELECT </>");
    }

    #[test]
    fn loose_visible_text_is_appended() {
        let mut tree = DomTree::new(body());
        let root = tree.root();
        tree.add_text(root, "Welcome back", true);
        tree.add_text(root, "hidden", false);
        let button = tree.add_element(root, indexed("button", 1, &[]));
        tree.add_text(button, "Continue", true);

        assert_eq!(
            clickable_elements_to_string(&tree, &include()),
            "Welcome back\n[1]<button> Continue </>"
        );
    }
}
