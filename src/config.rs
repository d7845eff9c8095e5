//! Connector configuration
//!
//! Tenant, credentials and report endpoints, loaded from YAML or JSON.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Default page size substituted into `PER_PAGE`
pub const DEFAULT_PER_PAGE: u32 = 200;

/// Default Human Resources service version
pub const DEFAULT_API_VERSION: &str = "37.2";

/// Report feeds and the config key holding their URL
pub const REPORT_FEEDS: &[&str] = &[
    "base_snapshot_report",
    "base_historical_report_compensation",
    "base_historical_report_job",
];

// ============================================================================
// Connector Config
// ============================================================================

/// Complete connector configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Tenant name
    pub tenant: String,

    /// Base service URL (e.g., `https://wd2-impl-services1.workday.com/ccx/service`)
    pub url: String,

    /// Integration system user
    pub username: String,

    /// Integration system user password
    pub password: String,

    /// Page size
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Human Resources service version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Custom report URL for the snapshot feed
    #[serde(default)]
    pub base_snapshot_report: Option<String>,

    /// Custom report URL for the historical compensation feed
    #[serde(default)]
    pub base_historical_report_compensation: Option<String>,

    /// Custom report URL for the historical job feed
    #[serde(default)]
    pub base_historical_report_job: Option<String>,

    /// Directory overriding the compiled-in request templates
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    /// Directory for decoded worker photos
    #[serde(default)]
    pub photo_dir: Option<PathBuf>,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("tenant", &self.tenant)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"********")
            .field("per_page", &self.per_page)
            .field("api_version", &self.api_version)
            .field("base_snapshot_report", &self.base_snapshot_report)
            .field(
                "base_historical_report_compensation",
                &self.base_historical_report_compensation,
            )
            .field("base_historical_report_job", &self.base_historical_report_job)
            .field("template_dir", &self.template_dir)
            .field("photo_dir", &self.photo_dir)
            .finish()
    }
}

impl ConnectorConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse and validate a YAML (or JSON) document
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and URL syntax
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("tenant", &self.tenant),
            ("url", &self.url),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        if self.per_page == 0 {
            return Err(Error::invalid_value("per_page", "must be greater than 0"));
        }

        Url::parse(&self.url).map_err(|e| Error::invalid_value("url", e.to_string()))?;

        for feed in REPORT_FEEDS {
            if let Some(report) = self.report(feed) {
                Url::parse(report).map_err(|e| Error::invalid_value(*feed, e.to_string()))?;
            }
        }

        Ok(())
    }

    /// Credentials for the WS-Security header
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.tenant, &self.username, &self.password)
    }

    /// Human Resources endpoint: `{url}/{tenant}/Human_Resources/{api_version}`
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.url.trim_end_matches('/');
        let endpoint = format!(
            "{base}/{}/Human_Resources/{}",
            self.tenant, self.api_version
        );
        Ok(Url::parse(&endpoint)?)
    }

    /// Configured report URL for a report feed
    ///
    /// `Ok(None)` when the feed is a report feed without a configured URL;
    /// an error when `feed` is not a report feed.
    pub fn report_url(&self, feed: &str) -> Result<Option<Url>> {
        if !REPORT_FEEDS.contains(&feed) {
            return Err(Error::invalid_value(feed, "not a report feed"));
        }
        self.report(feed)
            .map(|u| Url::parse(u).map_err(Error::from))
            .transpose()
    }

    fn report(&self, feed: &str) -> Option<&str> {
        match feed {
            "base_snapshot_report" => self.base_snapshot_report.as_deref(),
            "base_historical_report_compensation" => {
                self.base_historical_report_compensation.as_deref()
            }
            "base_historical_report_job" => self.base_historical_report_job.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Integration user credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Tenant name
    pub tenant: String,
    /// User name without tenant suffix
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(
        tenant: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Login name as sent in the header: `username@tenant`
    pub fn login(&self) -> String {
        format!("{}@{}", self.username, self.tenant)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
