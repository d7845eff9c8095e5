//! Leaf-level walker primitives
//!
//! Paths are `/`-separated element names. Every segment is qualified with
//! the context namespace; an optional `wd:` style prefix on a segment is
//! accepted and ignored.

use crate::error::{Error, Result};
use crate::types::{
    JsonObject, JsonValue, CONTENT_KEY, DESCRIPTOR_KEY, ID_LIST_KEY, ID_TYPE_KEY, UNKNOWN_ID,
    UNKNOWN_TYPE,
};
use roxmltree::Node;

/// Envelope namespaces that never count as the vendor namespace
pub const SOAP_ENVELOPE_NAMESPACES: &[&str] = &[
    "http://schemas.xmlsoap.org/soap/envelope/",
    "http://www.w3.org/2003/05/soap-envelope",
];

// ============================================================================
// Namespace Context
// ============================================================================

/// The dominant vendor namespace of one document, bound to the `wd` prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    uri: Option<String>,
}

impl Namespace {
    /// Conventional prefix for the vendor namespace
    pub const PREFIX: &'static str = "wd";

    /// Context for a known namespace URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
        }
    }

    /// Context that matches elements without a namespace
    pub fn unqualified() -> Self {
        Self::default()
    }

    /// The bound prefix
    pub fn prefix(&self) -> &'static str {
        Self::PREFIX
    }

    /// The bound URI, if any
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Whether `node` is an element named `local` in this namespace
    pub fn matches(&self, node: Node<'_, '_>, local: &str) -> bool {
        node.is_element()
            && node.tag_name().name() == local
            && node.tag_name().namespace() == self.uri()
    }

    /// Read an attribute, trying the qualified name before the bare one
    pub fn attribute<'a>(&self, node: Node<'a, '_>, local: &str) -> Option<&'a str> {
        match self.uri() {
            Some(uri) => node
                .attribute((uri, local))
                .or_else(|| node.attribute(local)),
            None => node.attribute(local),
        }
    }
}

/// Discover the vendor namespace of a document
///
/// Collects every element namespace other than the SOAP envelope ones.
/// One candidate binds to `wd`; none yields an unqualified context; more
/// than one is an [`Error::AmbiguousNamespace`].
pub fn discover_namespace(root: Node<'_, '_>) -> Result<Namespace> {
    let mut found: Vec<&str> = Vec::new();
    for node in root.descendants().filter(Node::is_element) {
        if let Some(uri) = node.tag_name().namespace() {
            if !SOAP_ENVELOPE_NAMESPACES.contains(&uri) && !found.contains(&uri) {
                found.push(uri);
            }
        }
    }

    match found.as_slice() {
        [] => Ok(Namespace::unqualified()),
        [uri] => Ok(Namespace::new(*uri)),
        many => Err(Error::AmbiguousNamespace {
            namespaces: many.iter().map(ToString::to_string).collect(),
        }),
    }
}

// ============================================================================
// Lookups
// ============================================================================

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|s| s.split_once(':').map_or(s, |(_, local)| local))
}

/// Resolve a path below `node`, taking the first match at each step
pub fn find<'a, 'i>(
    node: Option<Node<'a, 'i>>,
    path: &str,
    ns: &Namespace,
) -> Option<Node<'a, 'i>> {
    let mut current = node?;
    for segment in segments(path) {
        current = current.children().find(|c| ns.matches(*c, segment))?;
    }
    Some(current)
}

/// Resolve every element matching the last path segment
///
/// Intermediate segments take the first match; an absent parent yields an
/// empty list.
pub fn find_all<'a, 'i>(
    node: Option<Node<'a, 'i>>,
    path: &str,
    ns: &Namespace,
) -> Vec<Node<'a, 'i>> {
    let (parent, last) = match path.rsplit_once('/') {
        Some((parent, last)) => (find(node, parent, ns), last),
        None => (node, path),
    };
    let last = last.split_once(':').map_or(last, |(_, local)| local);

    parent.map_or_else(Vec::new, |p| {
        p.children().filter(|c| ns.matches(*c, last)).collect()
    })
}

/// First descendant element named `local`, in document order
pub fn find_descendant<'a, 'i>(
    node: Node<'a, 'i>,
    local: &str,
    ns: &Namespace,
) -> Option<Node<'a, 'i>> {
    node.descendants().find(|d| ns.matches(*d, local))
}

/// Every descendant element named `local`, in document order
pub fn find_descendants<'a, 'i>(
    node: Node<'a, 'i>,
    local: &str,
    ns: &Namespace,
) -> Vec<Node<'a, 'i>> {
    node.descendants().filter(|d| ns.matches(*d, local)).collect()
}

/// Text of the node at `path`
///
/// `None` when the input is `None`, the path does not resolve, or the
/// resolved node has no text.
pub fn find_text(node: Option<Node<'_, '_>>, path: &str, ns: &Namespace) -> Option<String> {
    find(node, path, ns)?.text().map(ToString::to_string)
}

/// Attribute of a node, with the same null-safety as [`find_text`]
pub fn get_attribute(node: Option<Node<'_, '_>>, name: &str, ns: &Namespace) -> Option<String> {
    node.and_then(|n| ns.attribute(n, name))
        .map(ToString::to_string)
}

// ============================================================================
// Reference Blocks
// ============================================================================

/// The `ID` children of a reference element as `{#content, -type}` entries
///
/// Missing text or type degrade to the sentinels; an absent container gives
/// an empty list.
pub fn find_all_ids(node: Option<Node<'_, '_>>, ns: &Namespace) -> Vec<JsonValue> {
    find_all(node, ID_LIST_KEY, ns)
        .into_iter()
        .map(|id| {
            let mut entry = JsonObject::new();
            entry.insert(
                CONTENT_KEY.to_string(),
                JsonValue::String(id.text().unwrap_or(UNKNOWN_ID).to_string()),
            );
            entry.insert(
                ID_TYPE_KEY.to_string(),
                JsonValue::String(
                    ns.attribute(id, "type")
                        .unwrap_or(UNKNOWN_TYPE)
                        .to_string(),
                ),
            );
            JsonValue::Object(entry)
        })
        .collect()
}

/// Normalize a reference element into `{ID: [...]}`
///
/// A `Descriptor` attribute, when present, is kept as `-Descriptor`.
/// An absent element is `null`.
pub fn reference_block(node: Option<Node<'_, '_>>, ns: &Namespace) -> JsonValue {
    let Some(node) = node else {
        return JsonValue::Null;
    };

    let mut block = JsonObject::new();
    if let Some(descriptor) = ns.attribute(node, "Descriptor") {
        block.insert(
            DESCRIPTOR_KEY.to_string(),
            JsonValue::String(descriptor.to_string()),
        );
    }
    block.insert(
        ID_LIST_KEY.to_string(),
        JsonValue::Array(find_all_ids(Some(node), ns)),
    );
    JsonValue::Object(block)
}
