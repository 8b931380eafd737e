//! Site adapters
//!
//! One adapter per portal. Every adapter implements the same capability set:
//! - `authenticate`: run the portal's login handshake and return a [`Session`]
//! - `enumerate_targets`: resolve the requested location codes
//! - `fetch_target`: fetch and extract one target into a [`LocationResult`]
//!
//! Adapters differ in URL shapes, form field names and in how many targets a
//! session exposes ([`Layout`]).

mod etslink;
mod form;
mod t18;

use crate::config::{Config, LocationEntry};
use crate::extract::extract;
use crate::fetch::{FetchError, FetchRequest, Fetcher};
use crate::model::{Credential, LinkRecord, LocationResult};
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub use etslink::EtsLinkAdapter;
pub use form::{
    has_input, login_fields, login_rejection, login_request, parse_login_form, LoginForm,
};
pub use t18::T18Adapter;

/// Why a login handshake failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("portal unavailable: {0}")]
    PortalUnavailable(String),
}

impl AuthError {
    /// Maps a failed login request: 401/403 reject the credential, anything
    /// else means the portal could not be reached
    pub fn from_login_fetch(err: FetchError) -> Self {
        match err {
            FetchError::Unauthorized { .. } => Self::InvalidCredential(err.to_string()),
            other => Self::PortalUnavailable(other.to_string()),
        }
    }
}

/// Supported portals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    T18,
    EtsLink,
}

impl Portal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T18 => "t18",
            Self::EtsLink => "etslink",
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown portal '{0}' (expected t18 or etslink)")]
pub struct UnknownPortal(pub String);

impl FromStr for Portal {
    type Err = UnknownPortal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t18" => Ok(Self::T18),
            "etslink" => Ok(Self::EtsLink),
            _ => Err(UnknownPortal(s.to_string())),
        }
    }
}

/// How many targets one login session exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One document per session; requested targets are ignored
    SingleDocument,

    /// Several locations behind one login
    MultiLocation,
}

/// An authenticated portal session
///
/// Owns the cookie store established by the login handshake. Scoped to one
/// run and never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    landing_url: Url,
}

impl Session {
    pub fn new(client: Client, landing_url: Url) -> Self {
        Self {
            client,
            landing_url,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Page the portal landed on after login
    pub fn landing_url(&self) -> &Url {
        &self.landing_url
    }
}

/// One resolved target of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    pub code: String,
    pub name: String,
    pub url: Url,
}

/// Outcome of resolving the requested targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Targets to fetch, in request order
    pub targets: Vec<TargetDescriptor>,

    /// Requested codes the portal does not know
    pub unknown: Vec<String>,
}

/// The capability set every portal adapter provides
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn portal(&self) -> Portal;

    /// Human-readable portal name used in log messages
    fn label(&self) -> &str;

    fn layout(&self) -> Layout;

    /// Configured default targets, available without a session
    fn known_targets(&self) -> Vec<LocationEntry>;

    async fn authenticate(&self, credential: &Credential) -> Result<Session, AuthError>;

    /// Resolves `requested` codes against the targets the portal supports
    ///
    /// `None` selects every known target. Unknown codes are reported in
    /// [`Enumeration::unknown`] instead of failing.
    async fn enumerate_targets(
        &self,
        session: &Session,
        requested: Option<&[String]>,
    ) -> Enumeration;

    /// Fetches and extracts one target; failures land in the result's `error`
    async fn fetch_target(&self, session: &Session, target: &TargetDescriptor) -> LocationResult;
}

/// Builds the adapter for `portal`
pub fn build_adapter(
    portal: Portal,
    config: &Config,
    fetcher: Arc<Fetcher>,
) -> Result<Box<dyn SiteAdapter>, ConfigError> {
    let adapter: Box<dyn SiteAdapter> = match portal {
        Portal::T18 => Box::new(T18Adapter::new(config.t18.clone(), fetcher)?),
        Portal::EtsLink => Box::new(EtsLinkAdapter::new(config.etslink.clone(), fetcher)?),
    };
    Ok(adapter)
}

/// Parses a configured base URL so that relative paths join below it
pub(crate) fn parse_base_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let mut normalized = value.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", field, e)))
}

/// Joins a configured path onto a base URL
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, ConfigError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", path, e)))
}

/// Trims, upper-cases and de-duplicates requested codes, keeping first-seen order
pub fn normalize_codes(requested: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    requested
        .iter()
        .map(|code| code.trim().to_ascii_uppercase())
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.clone()))
        .collect()
}

/// Resolves requested codes against the available entries
///
/// `url_for` builds the fetch URL of a known entry.
pub(crate) fn resolve_targets<F>(
    available: &[LocationEntry],
    requested: Option<&[String]>,
    mut url_for: F,
) -> Enumeration
where
    F: FnMut(&LocationEntry) -> Option<Url>,
{
    let mut enumeration = Enumeration::default();

    let selected: Vec<(String, Option<&LocationEntry>)> = match requested {
        None => available
            .iter()
            .map(|entry| (entry.code.to_ascii_uppercase(), Some(entry)))
            .collect(),
        Some(codes) => normalize_codes(codes)
            .into_iter()
            .map(|code| {
                let entry = available
                    .iter()
                    .find(|entry| entry.code.eq_ignore_ascii_case(&code));
                (code, entry)
            })
            .collect(),
    };

    for (code, entry) in selected {
        match entry.and_then(|entry| url_for(entry).map(|url| (entry, url))) {
            Some((entry, url)) => enumeration.targets.push(TargetDescriptor {
                code,
                name: entry.name.clone(),
                url,
            }),
            None => {
                tracing::warn!(location = %code, "Unknown location requested, skipping");
                enumeration.unknown.push(code);
            }
        }
    }

    enumeration
}

/// Keeps links worth showing and resolves them against the page URL
///
/// Drops `javascript:`, `mailto:`, `tel:` and `data:` hrefs as well as
/// fragment-only anchors. Hrefs that do not resolve are kept as written.
pub fn navigation_links(links: Vec<LinkRecord>, page_url: &Url) -> Vec<LinkRecord> {
    links
        .into_iter()
        .filter_map(|link| {
            let href = link.href.trim();
            let lowered = href.to_ascii_lowercase();

            if href.is_empty()
                || href.starts_with('#')
                || lowered.starts_with("javascript:")
                || lowered.starts_with("mailto:")
                || lowered.starts_with("tel:")
                || lowered.starts_with("data:")
            {
                return None;
            }

            let href = page_url
                .join(href)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| href.to_string());

            Some(LinkRecord {
                text: link.text,
                href,
            })
        })
        .collect()
}

/// GETs one target page within a session and extracts it
///
/// The page the login landed on is sent as the referrer, as a browser
/// navigating from it would.
pub(crate) async fn fetch_page(
    fetcher: &Fetcher,
    session: &Session,
    target: &TargetDescriptor,
) -> LocationResult {
    let request = FetchRequest::get(target.url.clone())
        .with_header("Referer", session.landing_url().as_str());

    match fetcher.fetch(session.client(), &request).await {
        Ok(response) => {
            let extraction = extract(&response.body);
            tracing::debug!(
                location = %target.code,
                status = response.status,
                tables = extraction.tables.len(),
                links = extraction.links.len(),
                "Extracted target page"
            );
            LocationResult::succeeded(
                &target.code,
                &target.name,
                extraction.title,
                navigation_links(extraction.links, &response.final_url),
                extraction.tables,
            )
        }
        Err(err) => {
            tracing::warn!(location = %target.code, error = %err, "Target fetch failed");
            LocationResult::failed(&target.code, &target.name, err.to_string())
        }
    }
}
