//! Record types produced by a scrape run
//!
//! These are the shapes handed to storage and presentation: link and table
//! records extracted from HTML, per-location outcomes, the ordered log trail
//! and the final [`ScrapeResult`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Login credential for one scrape invocation
///
/// Never serialized. The secret is redacted from `Debug` output.
#[derive(Clone, Deserialize)]
pub struct Credential {
    #[serde(alias = "username")]
    pub identifier: String,
    #[serde(alias = "password")]
    pub secret: String,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// True when both the identifier and the secret are present
    pub fn is_complete(&self) -> bool {
        !self.identifier.trim().is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Severity of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Success,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the ordered log trail returned with every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub kind: LogKind,
    pub message: String,
}

impl LogEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: LogKind::Error,
            message: message.into(),
        }
    }
}

/// A hyperlink found in a document
///
/// `text` may be empty; `href` is whatever the anchor carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub text: String,
    pub href: String,
}

/// A table found in a document
///
/// Rows keep the cell count present in the source markup, so rows of the
/// same table may differ in width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
}

impl TableRecord {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let row_count = rows.len();
        Self {
            headers,
            rows,
            row_count,
        }
    }

    /// True when rows differ in cell count
    pub fn is_ragged(&self) -> bool {
        let mut widths = self.rows.iter().map(Vec::len);
        match widths.next() {
            Some(first) => widths.any(|w| w != first),
            None => false,
        }
    }
}

/// Outcome of scraping one location
///
/// When `error` is set, `links` and `tables` are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResult {
    pub location_code: String,
    pub location_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub links: Vec<LinkRecord>,
    pub tables: Vec<TableRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LocationResult {
    pub fn succeeded(
        code: impl Into<String>,
        name: impl Into<String>,
        title: Option<String>,
        links: Vec<LinkRecord>,
        tables: Vec<TableRecord>,
    ) -> Self {
        Self {
            location_code: code.into(),
            location_name: name.into(),
            title,
            links,
            tables,
            error: None,
        }
    }

    pub fn failed(code: impl Into<String>, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            location_code: code.into(),
            location_name: name.into(),
            title: None,
            links: Vec::new(),
            tables: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Data shape for single-document portals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub links: Vec<LinkRecord>,
    pub tables: Vec<TableRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<LocationResult> for PageData {
    fn from(result: LocationResult) -> Self {
        Self {
            title: result.title,
            links: result.links,
            tables: result.tables,
            error: result.error,
        }
    }
}

/// Aggregated payload of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeData {
    /// One document (single-document portals)
    Page(PageData),

    /// Location code to outcome (multi-location portals)
    Locations(BTreeMap<String, LocationResult>),
}

impl ScrapeData {
    pub fn as_page(&self) -> Option<&PageData> {
        match self {
            Self::Page(page) => Some(page),
            Self::Locations(_) => None,
        }
    }

    pub fn as_locations(&self) -> Option<&BTreeMap<String, LocationResult>> {
        match self {
            Self::Page(_) => None,
            Self::Locations(locations) => Some(locations),
        }
    }
}

/// Final result of one orchestrator invocation
///
/// `success` is false only when the run failed before any target was
/// attempted (validation or authentication).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub logs: Vec<LogEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ScrapeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeResult {
    pub fn completed(logs: Vec<LogEvent>, data: ScrapeData) -> Self {
        Self {
            success: true,
            logs,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(logs: Vec<LogEvent>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            logs,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Looks up one location of a multi-location result
    pub fn location(&self, code: &str) -> Option<&LocationResult> {
        self.data.as_ref()?.as_locations()?.get(code)
    }
}
