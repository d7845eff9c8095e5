//! Error types for the Workday connector
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Extraction functions raise data errors (`XmlParse`, `CsvParse`, `Decode`,
//! `Extraction`, `AmbiguousNamespace`). The normalizer converts them exactly
//! once into [`Error::MalformedPayload`], tagged with the feed name.

use thiserror::Error;

/// The main error type for the Workday connector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Request template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template '{template}' requires a value for {token}")]
    MissingTemplateValue { template: String, token: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ============================================================================
    // Feed Errors
    // ============================================================================
    #[error("Unknown feed: {feed}")]
    UnknownFeed { feed: String },

    #[error("Feed '{feed}' does not build SOAP requests")]
    NoRequestTemplate { feed: String },

    #[error("Malformed payload for feed '{feed}'{}: {message}", path_suffix(.path.as_deref()))]
    MalformedPayload {
        feed: String,
        path: Option<String>,
        message: String,
    },

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("XML parsing error: {message}")]
    XmlParse { message: String },

    #[error("CSV parsing error: {message}")]
    CsvParse { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Unexpected structure at '{path}': {message}")]
    Extraction { path: String, message: String },

    #[error("Expected a single vendor namespace, found: {}", .namespaces.join(", "))]
    AmbiguousNamespace { namespaces: Vec<String> },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    #[error("Partition error for feed '{feed}': {message}")]
    Partition { feed: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Coarse classification of an [`Error`], used by the harness to pick a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Non-success status from the remote system; the harness owns retries
    Transport,
    /// Operator must fix configuration; never retryable
    Configuration,
    /// The body could not be read as the shape its feed expects
    MalformedPayload,
    /// An external photo sink failed
    Sink,
    /// Writing records out failed
    Output,
    /// Checkpoint state could not be read or written
    State,
    /// Anything else
    Other,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an XML parse error
    pub fn xml(message: impl Into<String>) -> Self {
        Self::XmlParse {
            message: message.into(),
        }
    }

    /// Create an extraction error pointing at the offending path
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown feed error
    pub fn unknown_feed(feed: impl Into<String>) -> Self {
        Self::UnknownFeed { feed: feed.into() }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a partition error
    pub fn partition(feed: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Partition {
            feed: feed.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Wrap a data error raised inside an extraction function as a
    /// malformed-payload error for `feed`. Other errors pass through.
    pub fn into_malformed(self, feed: &str) -> Self {
        if matches!(self, Error::AmbiguousNamespace { .. }) {
            return Error::MalformedPayload {
                feed: feed.to_string(),
                path: None,
                message: self.to_string(),
            };
        }
        let (path, message) = match self {
            Error::Extraction { path, message } => (Some(path), message),
            Error::XmlParse { message }
            | Error::CsvParse { message }
            | Error::Decode { message } => (None, message),
            other => return other,
        };
        Error::MalformedPayload {
            feed: feed.to_string(),
            path,
            message,
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpStatus { .. } => ErrorCategory::Transport,
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::InvalidUrl(_)
            | Error::TemplateNotFound { .. }
            | Error::MissingTemplateValue { .. }
            | Error::UnknownFeed { .. }
            | Error::NoRequestTemplate { .. } => ErrorCategory::Configuration,
            Error::MalformedPayload { .. }
            | Error::XmlParse { .. }
            | Error::CsvParse { .. }
            | Error::Decode { .. }
            | Error::Extraction { .. }
            | Error::AmbiguousNamespace { .. } => ErrorCategory::MalformedPayload,
            Error::Anyhow(_) => ErrorCategory::Sink,
            Error::Arrow(_) | Error::Parquet(_) | Error::Output { .. } => ErrorCategory::Output,
            Error::State { .. } | Error::Partition { .. } => ErrorCategory::State,
            Error::Io(_) | Error::FileNotFound { .. } | Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Render the optional path of a malformed-payload error
fn path_suffix(path: Option<&str>) -> String {
    path.map(|p| format!(" at '{p}'")).unwrap_or_default()
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::CsvParse {
            message: err.to_string(),
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::XmlParse {
            message: err.to_string(),
        }
    }
}

/// Result type alias for the Workday connector
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("tenant");
        assert_eq!(err.to_string(), "Missing required config field: tenant");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");
    }

    #[test]
    fn test_malformed_display_with_and_without_path() {
        let err = Error::extraction("Worker_Data/Photo_Data/Image", "bad base64").into_malformed("worker_details_photo");
        assert_eq!(
            err.to_string(),
            "Malformed payload for feed 'worker_details_photo' at 'Worker_Data/Photo_Data/Image': bad base64"
        );

        let err = Error::xml("unexpected end of stream").into_malformed("workers");
        assert_eq!(
            err.to_string(),
            "Malformed payload for feed 'workers': unexpected end of stream"
        );
    }

    #[test]
    fn test_into_malformed_passes_other_errors_through() {
        let err = Error::http_status(500, "boom").into_malformed("workers");
        assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::http_status(503, "").category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::MissingTemplateValue {
                template: "worker_details.xml".into(),
                token: "WORKER_ID".into()
            }
            .category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            Error::decode("x").into_malformed("workers").category(),
            ErrorCategory::MalformedPayload
        );
        assert_eq!(
            Error::from(anyhow::anyhow!("bucket unavailable")).category(),
            ErrorCategory::Sink
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(401, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let err = result.context("outer").unwrap_err();
        assert!(matches!(err, Error::Other(_)));
        assert!(err
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
