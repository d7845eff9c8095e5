//! Declarative field lists and full-tree conversion

use super::walker::{find, find_all, reference_block, Namespace};
use crate::types::{
    attribute_key, JsonObject, JsonValue, CONTENT_KEY, ID_LIST_KEY, ID_TYPE_KEY, UNKNOWN_ID,
    UNKNOWN_TYPE,
};
use roxmltree::Node;

/// One entry of a Data Block field list
///
/// Child names may be `/`-separated paths; the output key is always the
/// last segment.
#[derive(Debug, Clone, Copy)]
pub enum Field {
    /// Text of a child element, `null` when absent
    Text(&'static str),
    /// Attribute of the block element itself, keyed `-Name`
    Attribute(&'static str),
    /// Text of the block element itself, keyed `#content`
    Content,
    /// A single reference child as `{ID: [...]}`, `null` when absent
    Reference(&'static str),
    /// Every repetition of a reference child, always a list
    References(&'static str),
    /// A nested Data Block, `null` when absent
    Block(&'static str, &'static [Field]),
    /// Every repetition of a nested Data Block, always a list
    Blocks(&'static str, &'static [Field]),
    /// Full conversion of a child subtree via [`to_value`]
    Tree(&'static str),
}

impl Field {
    /// Output key of this field
    pub fn key(&self) -> String {
        match self {
            Field::Attribute(name) => attribute_key(name),
            Field::Content => CONTENT_KEY.to_string(),
            Field::Text(path)
            | Field::Reference(path)
            | Field::References(path)
            | Field::Block(path, _)
            | Field::Blocks(path, _)
            | Field::Tree(path) => last_segment(path).to_string(),
        }
    }

    fn value(&self, node: Node<'_, '_>, ns: &Namespace) -> JsonValue {
        let node = Some(node);
        match *self {
            Field::Text(path) => find(node, path, ns)
                .and_then(|n| n.text())
                .map_or(JsonValue::Null, |t| JsonValue::String(t.to_string())),
            Field::Attribute(name) => node
                .and_then(|n| ns.attribute(n, name))
                .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string())),
            Field::Content => node
                .and_then(own_text)
                .map_or(JsonValue::Null, JsonValue::String),
            Field::Reference(path) => reference_block(find(node, path, ns), ns),
            Field::References(path) => JsonValue::Array(
                find_all(node, path, ns)
                    .into_iter()
                    .map(|n| reference_block(Some(n), ns))
                    .collect(),
            ),
            Field::Block(path, fields) => data_block(find(node, path, ns), fields, ns),
            Field::Blocks(path, fields) => JsonValue::Array(
                find_all(node, path, ns)
                    .into_iter()
                    .map(|n| data_block(Some(n), fields, ns))
                    .collect(),
            ),
            Field::Tree(path) => find(node, path, ns).map_or(JsonValue::Null, to_value),
        }
    }
}

fn last_segment(path: &str) -> &str {
    let last = path.rsplit('/').next().unwrap_or(path);
    last.split_once(':').map_or(last, |(_, local)| local)
}

/// Build a Data Block from a field list
///
/// An absent node is `null`; absent fields inside a present node are `null`
/// (or an empty list for the repeated kinds).
pub fn data_block(node: Option<Node<'_, '_>>, fields: &[Field], ns: &Namespace) -> JsonValue {
    let Some(node) = node else {
        return JsonValue::Null;
    };

    let mut block = JsonObject::new();
    for field in fields {
        block.insert(field.key(), field.value(node, ns));
    }
    JsonValue::Object(block)
}

// ============================================================================
// Full-tree conversion
// ============================================================================

/// Trimmed, non-empty text directly inside `node`
fn own_text(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .children()
        .filter(Node::is_text)
        .filter_map(|t| t.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Convert a subtree into the attribute-decorated record shape
///
/// Element keys use local names. Attributes become `-name`, text next to
/// attributes or children becomes `#content`, and repeated siblings become
/// lists. A leaf without attributes is its text (or `null` when empty).
///
/// `ID` elements are always collected into a list of
/// `{#content, -type}` entries carrying the sentinels when data is missing,
/// so reference blocks keep one shape regardless of cardinality.
pub fn to_value(node: Node<'_, '_>) -> JsonValue {
    let attributes: Vec<_> = node.attributes().collect();
    let has_children = node.children().any(|c| c.is_element());

    if attributes.is_empty() && !has_children {
        return own_text(node).map_or(JsonValue::Null, JsonValue::String);
    }

    let mut object = JsonObject::new();
    for attr in attributes {
        object.insert(
            attribute_key(attr.name()),
            JsonValue::String(attr.value().to_string()),
        );
    }

    for child in node.children().filter(Node::is_element) {
        let name = child.tag_name().name();
        if name == ID_LIST_KEY {
            push_list(&mut object, name, id_entry(child));
            continue;
        }

        let value = to_value(child);
        match object.get_mut(name) {
            Some(JsonValue::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = JsonValue::Array(vec![first, value]);
            }
            None => {
                object.insert(name.to_string(), value);
            }
        }
    }

    if let Some(text) = own_text(node) {
        object.insert(CONTENT_KEY.to_string(), JsonValue::String(text));
    }

    JsonValue::Object(object)
}

fn push_list(object: &mut JsonObject, key: &str, value: JsonValue) {
    match object.get_mut(key) {
        Some(JsonValue::Array(items)) => items.push(value),
        _ => {
            object.insert(key.to_string(), JsonValue::Array(vec![value]));
        }
    }
}

fn id_entry(node: Node<'_, '_>) -> JsonValue {
    let mut entry = match to_value(node) {
        JsonValue::Object(object) => object,
        JsonValue::String(text) => {
            let mut object = JsonObject::new();
            object.insert(CONTENT_KEY.to_string(), JsonValue::String(text));
            object
        }
        _ => JsonObject::new(),
    };
    entry
        .entry(CONTENT_KEY)
        .or_insert_with(|| JsonValue::String(UNKNOWN_ID.to_string()));
    entry
        .entry(ID_TYPE_KEY)
        .or_insert_with(|| JsonValue::String(UNKNOWN_TYPE.to_string()));
    JsonValue::Object(entry)
}
