//! Request template engine
//!
//! Builds SOAP request envelopes from plain-text templates with literal
//! uppercase placeholder tokens. Templates are loaded once (compiled in, or
//! read from an override directory) and cached for the process lifetime.
//!
//! Substitution is a single left-to-right pass: a token is replaced where it
//! appears verbatim (case-sensitive), and inserted values are never
//! re-scanned. Values are XML-escaped before insertion.

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::partition::{PartitionValue, AS_OF_FIELD, SUBCATEGORY_FIELD, WORKER_ID_FIELD};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

// ============================================================================
// Tokens
// ============================================================================

/// Page number, 1-based
pub const PAGE_NUMBER: &str = "PAGE_NUMBER";
/// Page size
pub const PER_PAGE: &str = "PER_PAGE";
/// Worker identifier (required when present)
pub const WORKER_ID: &str = "WORKER_ID";
/// As-of effective date, `YYYY-MM-DD` (required when present)
pub const AS_OF_EFFECTIVE_DATE: &str = "AS_OF_EFFECTIVE_DATE";
/// Reference category token (required when present)
pub const REFERENCE_SUBCATEGORY_TYPE: &str = "REFERENCE_SUBCATEGORY_TYPE";

/// Header slot in the envelope template
pub const SOAP_HEADER: &str = "SOAP_HEADER";
/// Body slot in the envelope template
pub const SOAP_BODY: &str = "SOAP_BODY";
/// `username@tenant` slot in the header template
pub const SOAP_USERNAME: &str = "SOAP_USERNAME";
/// Password slot in the header template
pub const SOAP_PASSWORD: &str = "SOAP_PASSWORD";

/// Envelope template file name
pub const ENVELOPE_TEMPLATE: &str = "base.xml";
/// Header template file name
pub const HEADER_TEMPLATE: &str = "header.xml";

static PASSWORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(<(?:[A-Za-z_][\w.-]*:)?Password\b[^>]*>).*?(</(?:[A-Za-z_][\w.-]*:)?Password>)")
        .unwrap()
});

/// Compiled-in templates, keyed by file name
const BUILTIN: &[(&str, &str)] = &[
    (ENVELOPE_TEMPLATE, include_str!("../templates/base.xml")),
    (HEADER_TEMPLATE, include_str!("../templates/header.xml")),
    ("workers.xml", include_str!("../templates/workers.xml")),
    ("worker_details.xml", include_str!("../templates/worker_details.xml")),
    (
        "worker_details_history.xml",
        include_str!("../templates/worker_details_history.xml"),
    ),
    (
        "worker_details_photo.xml",
        include_str!("../templates/worker_details_photo.xml"),
    ),
    (
        "organization_hierarchies.xml",
        include_str!("../templates/organization_hierarchies.xml"),
    ),
    ("ethnicities.xml", include_str!("../templates/ethnicities.xml")),
    (
        "gender_identities.xml",
        include_str!("../templates/gender_identities.xml"),
    ),
    ("locations.xml", include_str!("../templates/locations.xml")),
    ("job_profiles.xml", include_str!("../templates/job_profiles.xml")),
    ("positions.xml", include_str!("../templates/positions.xml")),
    (
        "sexual_orientations.xml",
        include_str!("../templates/sexual_orientations.xml"),
    ),
    ("references.xml", include_str!("../templates/references.xml")),
];

// ============================================================================
// Request Parameters
// ============================================================================

/// Values substituted into a feed's body template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    /// Page number (1-based)
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Worker identifier
    pub worker_id: Option<String>,
    /// As-of effective date
    pub as_of_effective_date: Option<NaiveDate>,
    /// Reference category token
    pub reference_subcategory_type: Option<String>,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: crate::config::DEFAULT_PER_PAGE,
            worker_id: None,
            as_of_effective_date: None,
            reference_subcategory_type: None,
        }
    }
}

impl RequestParams {
    /// Parameters for one page
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Default::default()
        }
    }

    /// Set the worker identifier
    #[must_use]
    pub fn worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    /// Set the as-of effective date
    #[must_use]
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of_effective_date = Some(date);
        self
    }

    /// Set the reference category token
    #[must_use]
    pub fn subcategory(mut self, category: impl Into<String>) -> Self {
        self.reference_subcategory_type = Some(category.into());
        self
    }

    /// Fill feed parameters from a partition
    ///
    /// Keys the partition does not carry leave the current value untouched.
    pub fn with_partition(mut self, partition: &PartitionValue) -> Result<Self> {
        if let Some(worker_id) = partition.get_string(WORKER_ID_FIELD) {
            self.worker_id = Some(worker_id.to_string());
        }
        if let Some(date) = partition.get_string(AS_OF_FIELD) {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| Error::invalid_value(AS_OF_FIELD, format!("'{date}': {e}")))?;
            self.as_of_effective_date = Some(parsed);
        }
        if let Some(category) = partition.get_string(SUBCATEGORY_FIELD) {
            self.reference_subcategory_type = Some(category.to_string());
        }
        Ok(self)
    }
}

// ============================================================================
// Template Cache
// ============================================================================

/// Cached request templates
#[derive(Debug, Clone)]
pub struct RequestTemplates {
    envelope: String,
    header: String,
    bodies: HashMap<String, String>,
}

impl RequestTemplates {
    /// Templates compiled into the binary
    pub fn builtin() -> Self {
        let mut envelope = String::new();
        let mut header = String::new();
        let mut bodies = HashMap::new();
        for (name, contents) in BUILTIN {
            match *name {
                ENVELOPE_TEMPLATE => envelope = (*contents).to_string(),
                HEADER_TEMPLATE => header = (*contents).to_string(),
                _ => {
                    bodies.insert((*name).to_string(), (*contents).to_string());
                }
            }
        }
        Self {
            envelope,
            header,
            bodies,
        }
    }

    /// Load every known template from a directory
    ///
    /// Fails with [`Error::TemplateNotFound`] if any file is missing.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| -> Result<String> {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(Error::TemplateNotFound {
                    name: path.display().to_string(),
                });
            }
            Ok(std::fs::read_to_string(path)?)
        };

        let mut bodies = HashMap::new();
        for (name, _) in BUILTIN {
            if *name != ENVELOPE_TEMPLATE && *name != HEADER_TEMPLATE {
                bodies.insert((*name).to_string(), read(name)?);
            }
        }

        debug!(dir = %dir.display(), templates = bodies.len(), "Loaded request templates");

        Ok(Self {
            envelope: read(ENVELOPE_TEMPLATE)?,
            header: read(HEADER_TEMPLATE)?,
            bodies,
        })
    }

    /// Look up a body template by file name
    pub fn get(&self, name: &str) -> Result<&str> {
        self.bodies
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Names of the cached body templates
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bodies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a complete request envelope
    ///
    /// Required values are checked before anything is rendered, so a missing
    /// value fails without producing a partial request.
    pub fn build_request(
        &self,
        template: &str,
        credentials: &Credentials,
        params: &RequestParams,
    ) -> Result<String> {
        let body_template = self.get(template)?;
        let body = fill_body(template, body_template, params)?;

        let header = substitute(
            &self.header,
            &[
                (SOAP_USERNAME, escape_xml(&credentials.login()).as_str()),
                (SOAP_PASSWORD, escape_xml(&credentials.password).as_str()),
            ],
        );
        let request = substitute(
            &self.envelope,
            &[(SOAP_HEADER, header.as_str()), (SOAP_BODY, body.as_str())],
        );

        debug!(
            template,
            page = params.page,
            body = %redact_password(&request),
            "Built request"
        );

        Ok(request)
    }
}

impl Default for RequestTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

fn fill_body(name: &str, template: &str, params: &RequestParams) -> Result<String> {
    let mut values = vec![
        (PAGE_NUMBER, params.page.to_string()),
        (PER_PAGE, params.per_page.to_string()),
    ];
    values.extend(required_value(name, template, WORKER_ID, params.worker_id.clone())?);
    values.extend(required_value(
        name,
        template,
        AS_OF_EFFECTIVE_DATE,
        params
            .as_of_effective_date
            .map(|d| d.format("%Y-%m-%d").to_string()),
    )?);
    values.extend(required_value(
        name,
        template,
        REFERENCE_SUBCATEGORY_TYPE,
        params.reference_subcategory_type.clone(),
    )?);

    let pairs: Vec<(&str, &str)> = values.iter().map(|(t, v)| (*t, v.as_str())).collect();
    Ok(substitute(template, &pairs))
}

/// Escaped substitution for `token` if the template uses it
fn required_value(
    name: &str,
    template: &str,
    token: &'static str,
    value: Option<String>,
) -> Result<Option<(&'static str, String)>> {
    if !template.contains(token) {
        return Ok(None);
    }
    match value {
        Some(v) => Ok(Some((token, escape_xml(&v)))),
        None => Err(Error::MissingTemplateValue {
            template: name.to_string(),
            token: token.to_string(),
        }),
    }
}

// ============================================================================
// Text Helpers
// ============================================================================

/// Replace tokens in one pass
///
/// At each position the earliest occurrence wins; on a tie the longest token
/// wins. Text produced by a replacement is not scanned again.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter(|(token, _)| !token.is_empty())
            .filter_map(|(token, value)| rest.find(token).map(|pos| (pos, *token, *value)))
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())));

        match next {
            Some((pos, token, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + token.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Tokens from `candidates` that appear in `template`
pub fn tokens_in<'a>(template: &str, candidates: &[&'a str]) -> Vec<&'a str> {
    candidates
        .iter()
        .copied()
        .filter(|token| template.contains(token))
        .collect()
}

/// Escape text for inclusion in XML content or attributes
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Mask the WS-Security password element for logging
pub fn redact_password(request: &str) -> String {
    PASSWORD_REGEX
        .replace_all(request, "${1}********${2}")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn credentials() -> Credentials {
        Credentials::new("acme", "isu_user", "s3cret")
    }

    #[test]
    fn test_substitute_single_pass() {
        let result = substitute("A TOKEN B", &[("TOKEN", "TOKEN TOKEN")]);
        assert_eq!(result, "A TOKEN TOKEN B");
    }

    #[test]
    fn test_substitute_longest_token_wins() {
        let result = substitute("PAGE_SIZE", &[("PAGE", "x"), ("PAGE_SIZE", "y")]);
        assert_eq!(result, "y");
    }

    #[test]
    fn test_substitute_absent_tokens_are_ignored() {
        assert_eq!(substitute("no tokens", &[("WORKER_ID", "1")]), "no tokens");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&apos;");
    }

    #[test]
    fn test_tokens_in() {
        let tokens = tokens_in(
            "<a>PAGE_NUMBER</a><b>WORKER_ID</b>",
            &[PAGE_NUMBER, PER_PAGE, WORKER_ID],
        );
        assert_eq!(tokens, vec![PAGE_NUMBER, WORKER_ID]);
    }

    #[test]
    fn test_builtin_templates_cover_request_feeds() {
        let templates = RequestTemplates::builtin();
        for feed in crate::feeds::FeedRegistry::new().iter() {
            if let Some(name) = feed.request_template {
                assert!(templates.get(name).is_ok(), "missing template {name}");
            }
        }
        assert!(matches!(
            templates.get("nope.xml"),
            Err(Error::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_build_request_wraps_header_and_body() {
        let templates = RequestTemplates::builtin();
        let request = templates
            .build_request("workers.xml", &credentials(), &RequestParams::new(3, 50))
            .unwrap();

        assert!(request.contains("isu_user@acme"));
        assert!(request.contains("s3cret"));
        assert!(request.contains("<bsvc:Page>3</bsvc:Page>"));
        assert!(request.contains("<bsvc:Count>50</bsvc:Count>"));
        assert!(!request.contains(SOAP_HEADER));
        assert!(!request.contains(SOAP_BODY));
        assert!(!request.contains(PAGE_NUMBER));
        assert!(roxmltree::Document::parse(&request).is_ok());
    }

    #[test]
    fn test_build_request_is_deterministic() {
        let templates = RequestTemplates::builtin();
        let params = RequestParams::new(1, 200).worker_id("21001");
        let a = templates
            .build_request("worker_details.xml", &credentials(), &params)
            .unwrap();
        let b = templates
            .build_request("worker_details.xml", &credentials(), &params)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_request_requires_worker_id() {
        let templates = RequestTemplates::builtin();
        let err = templates
            .build_request("worker_details.xml", &credentials(), &RequestParams::default())
            .unwrap_err();
        match err {
            Error::MissingTemplateValue { template, token } => {
                assert_eq!(template, "worker_details.xml");
                assert_eq!(token, WORKER_ID);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_build_request_requires_effective_date_and_category() {
        let templates = RequestTemplates::builtin();
        let params = RequestParams::default().worker_id("21001");
        let err = templates
            .build_request("worker_details_history.xml", &credentials(), &params)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingTemplateValue { ref token, .. } if token == AS_OF_EFFECTIVE_DATE
        ));

        let err = templates
            .build_request("references.xml", &credentials(), &RequestParams::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingTemplateValue { ref token, .. } if token == REFERENCE_SUBCATEGORY_TYPE
        ));
    }

    #[test]
    fn test_build_request_escapes_values() {
        let templates = RequestTemplates::builtin();
        let creds = Credentials::new("acme", "user", "p<w>&d");
        let params = RequestParams::default().worker_id("a&b");
        let request = templates
            .build_request("worker_details.xml", &creds, &params)
            .unwrap();
        assert!(request.contains("p&lt;w&gt;&amp;d"));
        assert!(request.contains("a&amp;b"));
    }

    #[test]
    fn test_with_partition() {
        let partition = PartitionValue::new("21001_2020-01-02")
            .with_string(WORKER_ID_FIELD, "21001")
            .with_string(AS_OF_FIELD, "2020-01-02");
        let params = RequestParams::default().with_partition(&partition).unwrap();
        assert_eq!(params.worker_id.as_deref(), Some("21001"));
        assert_eq!(
            params.as_of_effective_date,
            NaiveDate::from_ymd_opt(2020, 1, 2)
        );

        let bad = PartitionValue::new("x").with_string(AS_OF_FIELD, "yesterday");
        assert!(RequestParams::default().with_partition(&bad).is_err());
    }

    #[test]
    fn test_redact_password() {
        let request = RequestTemplates::builtin()
            .build_request("workers.xml", &credentials(), &RequestParams::default())
            .unwrap();
        let redacted = redact_password(&request);
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains("********"));
        assert!(redacted.contains("isu_user@acme"));
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENVELOPE_TEMPLATE), "SOAP_HEADER SOAP_BODY").unwrap();
        let err = RequestTemplates::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound { .. }));
    }

    #[test]
    fn test_from_dir_reads_every_template() {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in BUILTIN {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        std::fs::write(dir.path().join("workers.xml"), "<custom>PAGE_NUMBER</custom>").unwrap();

        let templates = RequestTemplates::from_dir(dir.path()).unwrap();
        let request = templates
            .build_request("workers.xml", &credentials(), &RequestParams::new(7, 10))
            .unwrap();
        assert!(request.contains("<custom>7</custom>"));
    }
}
