//! Namespace-aware XML tree walker
//!
//! Safe, null-tolerant access into parsed vendor documents.
//!
//! # Overview
//!
//! Every lookup here returns `None` or an empty list when a node is absent,
//! so extraction functions can stay declarative:
//! - `discover_namespace` - find the one vendor namespace of a document
//! - `find` / `find_all` / `find_text` / `get_attribute` - qualified lookups
//! - `find_all_ids` / `reference_block` - the `{ID: [...]}` reference shape
//! - `Field` / `data_block` - declarative field lists for data blocks
//! - `to_value` - full-fidelity conversion of a subtree
//!
//! # Namespace constraint
//!
//! All lookups are qualified with a single [`Namespace`]. Documents carrying
//! more than one vendor namespace are rejected by `discover_namespace`
//! instead of silently picking one.

mod fields;
mod walker;

pub use fields::{data_block, to_value, Field};
pub use walker::{
    discover_namespace, find, find_all, find_all_ids, find_descendant, find_descendants,
    find_text, get_attribute, reference_block, Namespace, SOAP_ENVELOPE_NAMESPACES,
};

#[cfg(test)]
mod tests;
