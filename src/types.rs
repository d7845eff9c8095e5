//! Common types used throughout the connector
//!
//! This module contains shared type definitions, type aliases,
//! and the key conventions of the normalized record shape.

use crate::error::{Error, Result};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One normalized record yielded to the harness
pub type Record = JsonObject;

// ============================================================================
// Record Conventions
// ============================================================================

/// Key holding the text of a mixed-content element
pub const CONTENT_KEY: &str = "#content";

/// Key holding the `type` attribute of an ID entry
pub const ID_TYPE_KEY: &str = "-type";

/// Key holding the list of IDs in a reference block
pub const ID_LIST_KEY: &str = "ID";

/// Key holding the `Descriptor` attribute of a reference
pub const DESCRIPTOR_KEY: &str = "-Descriptor";

/// Sentinel for an ID entry without text
pub const UNKNOWN_ID: &str = "Unknown ID";

/// Sentinel for an ID entry without a `type` attribute
pub const UNKNOWN_TYPE: &str = "Unknown Type";

/// Prefix applied to attribute names in normalized output
pub const ATTRIBUTE_PREFIX: char = '-';

/// Output key for an attribute (`Primary` becomes `-Primary`)
pub fn attribute_key(name: &str) -> String {
    format!("{ATTRIBUTE_PREFIX}{name}")
}

// ============================================================================
// Raw Response
// ============================================================================

/// A response body and status code as received from the remote system
///
/// The normalizer never owns transport; the harness hands this in per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body bytes
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Create a response with an explicit status
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a `200 OK` response
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    /// Whether the status indicates success
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Borrow the body as UTF-8 text
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| Error::decode(format!("Response body is not UTF-8: {e}")))
    }

    /// Body as text, replacing invalid UTF-8 (for error messages)
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_key() {
        assert_eq!(attribute_key("type"), "-type");
        assert_eq!(attribute_key("Descriptor"), DESCRIPTOR_KEY);
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::ok("").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }

    #[test]
    fn test_raw_response_text() {
        let response = RawResponse::ok("<a/>");
        assert_eq!(response.text().unwrap(), "<a/>");

        let invalid = RawResponse::ok(vec![0xff, 0xfe]);
        assert!(matches!(invalid.text(), Err(Error::Decode { .. })));
        assert_eq!(invalid.text_lossy(), "\u{fffd}\u{fffd}");
    }
}
