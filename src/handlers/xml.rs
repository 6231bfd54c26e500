//! XML handler.

use super::Handler;
use crate::error::ParseError;
use crate::merge::coalesce;
use crate::value::{Mapping, Value};
use roxmltree::{Document, Node};
use std::path::Path;

/// Key holding an element's attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Key holding the text of an element that also carries attributes.
pub const TEXT_KEY: &str = "@value";

/// Converts an XML element tree into nested mappings.
///
/// The root element's children become top-level keys. A text-only element
/// becomes a string, an empty element an empty mapping. Sibling elements that
/// share a tag name are collected into a coalesced sequence in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlHandler;

impl Handler for XmlHandler {
    fn parse(&self, path: &Path) -> Result<Value, ParseError> {
        let content = ParseError::read_to_string(path)?;
        let document = Document::parse(&content)?;
        Ok(convert_element(document.root_element()))
    }
}

fn convert_element(node: Node<'_, '_>) -> Value {
    let mut mapping = Mapping::new();

    let attributes: Mapping = node
        .attributes()
        .map(|attr| (attr.name().to_string(), Value::from(attr.value())))
        .collect();
    if !attributes.is_empty() {
        mapping.insert(ATTRIBUTES_KEY.to_string(), Value::Mapping(attributes));
    }

    let mut has_children = false;
    for child in node.children().filter(Node::is_element) {
        has_children = true;
        let name = child.tag_name().name().to_string();
        let value = convert_element(child);
        match mapping.get_mut(&name) {
            Some(existing) => coalesce(existing, value),
            None => {
                mapping.insert(name, value);
            }
        }
    }

    if has_children {
        return Value::Mapping(mapping);
    }

    let text = element_text(node);
    match (text, mapping.is_empty()) {
        (Some(text), true) => Value::from(text),
        (Some(text), false) => {
            mapping.insert(TEXT_KEY.to_string(), Value::from(text));
            Value::Mapping(mapping)
        }
        (None, _) => Value::Mapping(mapping),
    }
}

/// Trimmed text of a leaf element, `None` when blank.
fn element_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
