//! ETSLink adapter
//!
//! One login exposes several terminal locations. Each location is scraped
//! from the inquiry page with the terminal code passed as a query parameter.

use crate::adapter::{
    fetch_page, has_input, join_path, login_rejection, login_request, parse_base_url,
    resolve_targets, AuthError, Enumeration, Layout, Portal, Session, SiteAdapter,
    TargetDescriptor,
};
use crate::config::{EtsLinkConfig, LocationEntry};
use crate::extract::collapse_whitespace;
use crate::fetch::{FetchRequest, Fetcher};
use crate::model::{Credential, LocationResult};
use crate::ConfigError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Input the portal adds when it wants an interactive verification code
const VERIFY_CODE_FIELD: &str = "PI_VERIFY_CODE";

pub struct EtsLinkAdapter {
    config: EtsLinkConfig,
    fetcher: Arc<Fetcher>,
    login_url: Url,
    inquiry_url: Url,
    locations_url: Option<Url>,
}

impl EtsLinkAdapter {
    pub fn new(config: EtsLinkConfig, fetcher: Arc<Fetcher>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url("etslink.base_url", &config.base_url)?;
        let login_url = join_path(&base_url, &config.login_path)?;
        let inquiry_url = join_path(&base_url, &config.inquiry_path)?;
        let locations_url = config
            .locations_path
            .as_deref()
            .map(|path| join_path(&base_url, path))
            .transpose()?;

        Ok(Self {
            config,
            fetcher,
            login_url,
            inquiry_url,
            locations_url,
        })
    }

    /// Inquiry page URL for one terminal code
    pub fn inquiry_url_for(&self, code: &str) -> Url {
        let mut url = self.inquiry_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.config.terminal_param, code);
        url
    }

    /// Locations offered to the logged-in account
    ///
    /// Reads the live list when a locations page is configured and falls back
    /// to the configured set when that page is unusable.
    async fn available_locations(&self, session: &Session) -> Vec<LocationEntry> {
        let Some(url) = &self.locations_url else {
            return self.config.locations.clone();
        };

        match self
            .fetcher
            .fetch(session.client(), &FetchRequest::get(url.clone()))
            .await
        {
            Ok(response) => {
                let live = parse_location_options(&response.body);
                if live.is_empty() {
                    tracing::warn!(url = %url, "Locations page listed no terminals, using configured set");
                    self.config.locations.clone()
                } else {
                    tracing::debug!(count = live.len(), "Loaded live location list");
                    live
                }
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "Failed to load live locations, using configured set");
                self.config.locations.clone()
            }
        }
    }
}

/// True when the landing page after login is part of the logged-in area
fn is_logged_in_area(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.contains("main") || path.contains("home")
}

/// Reads `<option value>` entries as location codes
///
/// Codes are upper-cased; blank, non-alphanumeric and repeated codes are
/// skipped. The option text becomes the location name.
pub fn parse_location_options(html: &str) -> Vec<LocationEntry> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("option[value]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for option in document.select(&selector) {
        let code = option
            .value()
            .attr("value")
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();

        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            continue;
        }
        if !seen.insert(code.clone()) {
            continue;
        }

        let text = collapse_whitespace(&option.text().collect::<String>());
        let name = if text.is_empty() { code.clone() } else { text };
        entries.push(LocationEntry::new(code, name));
    }

    entries
}

#[async_trait]
impl SiteAdapter for EtsLinkAdapter {
    fn portal(&self) -> Portal {
        Portal::EtsLink
    }

    fn label(&self) -> &str {
        "ETSLink"
    }

    fn layout(&self) -> Layout {
        Layout::MultiLocation
    }

    fn known_targets(&self) -> Vec<LocationEntry> {
        self.config.locations.clone()
    }

    async fn authenticate(&self, credential: &Credential) -> Result<Session, AuthError> {
        let client = self
            .fetcher
            .session_client()
            .map_err(|e| AuthError::PortalUnavailable(e.to_string()))?;

        // The login page sets the session cookie and may carry hidden fields.
        let login_page = self
            .fetcher
            .fetch(&client, &FetchRequest::get(self.login_url.clone()))
            .await
            .map_err(|e| AuthError::PortalUnavailable(e.to_string()))?;

        let request = login_request(
            &login_page,
            &self.login_url,
            &self.config.username_field,
            &self.config.password_field,
            credential,
        );
        tracing::debug!(
            action = %request.url(),
            method = ?request.method(),
            "Submitting ETSLink login form"
        );

        let response = self
            .fetcher
            .fetch(&client, &request)
            .await
            .map_err(AuthError::from_login_fetch)?;

        if has_input(&response.body, VERIFY_CODE_FIELD) {
            return Err(AuthError::InvalidCredential(
                "verification code required".to_string(),
            ));
        }

        if !is_logged_in_area(&response.final_url) {
            if let Some(reason) = login_rejection(&response.body) {
                return Err(AuthError::InvalidCredential(reason));
            }
        }

        Ok(Session::new(client, response.final_url))
    }

    async fn enumerate_targets(
        &self,
        session: &Session,
        requested: Option<&[String]>,
    ) -> Enumeration {
        let available = self.available_locations(session).await;
        resolve_targets(&available, requested, |entry| {
            Some(self.inquiry_url_for(&entry.code.to_ascii_uppercase()))
        })
    }

    async fn fetch_target(&self, session: &Session, target: &TargetDescriptor) -> LocationResult {
        fetch_page(&self.fetcher, session, target).await
    }
}
