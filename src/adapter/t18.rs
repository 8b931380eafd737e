//! T18 Tideworks adapter
//!
//! Login is a container-managed form login: GET the login page, echo its
//! hidden fields with the credential to the form action (usually
//! `j_security_check`), then scrape the dashboard as a single document.

use crate::adapter::{
    fetch_page, join_path, login_rejection, login_request, parse_base_url, AuthError,
    Enumeration, Layout, Portal, Session, SiteAdapter, TargetDescriptor,
};
use crate::config::{LocationEntry, T18Config};
use crate::fetch::{FetchRequest, Fetcher};
use crate::model::{Credential, LocationResult};
use crate::ConfigError;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Code of the single target this portal exposes
pub const DASHBOARD_CODE: &str = "DASHBOARD";

pub struct T18Adapter {
    config: T18Config,
    fetcher: Arc<Fetcher>,
    login_url: Url,
    login_action_url: Url,
    dashboard_url: Url,
}

impl T18Adapter {
    pub fn new(config: T18Config, fetcher: Arc<Fetcher>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url("t18.base_url", &config.base_url)?;
        let login_url = join_path(&base_url, &config.login_page)?;
        let login_action_url = join_path(&base_url, &config.login_action)?;
        let dashboard_url = join_path(&base_url, &config.dashboard_path)?;

        Ok(Self {
            config,
            fetcher,
            login_url,
            login_action_url,
            dashboard_url,
        })
    }

    fn dashboard_entry(&self) -> LocationEntry {
        LocationEntry::new(DASHBOARD_CODE, "T18 Dashboard")
    }
}

#[async_trait]
impl SiteAdapter for T18Adapter {
    fn portal(&self) -> Portal {
        Portal::T18
    }

    fn label(&self) -> &str {
        "T18"
    }

    fn layout(&self) -> Layout {
        Layout::SingleDocument
    }

    fn known_targets(&self) -> Vec<LocationEntry> {
        vec![self.dashboard_entry()]
    }

    async fn authenticate(&self, credential: &Credential) -> Result<Session, AuthError> {
        let client = self
            .fetcher
            .session_client()
            .map_err(|e| AuthError::PortalUnavailable(e.to_string()))?;

        tracing::debug!(url = %self.login_url, "Fetching T18 login page");
        let login_page = self
            .fetcher
            .fetch(&client, &FetchRequest::get(self.login_url.clone()))
            .await
            .map_err(|e| AuthError::PortalUnavailable(e.to_string()))?;

        let request = login_request(
            &login_page,
            &self.login_action_url,
            &self.config.username_field,
            &self.config.password_field,
            credential,
        );
        tracing::debug!(
            action = %request.url(),
            method = ?request.method(),
            "Submitting T18 login form"
        );

        let response = self
            .fetcher
            .fetch(&client, &request)
            .await
            .map_err(AuthError::from_login_fetch)?;

        if let Some(reason) = login_rejection(&response.body) {
            return Err(AuthError::InvalidCredential(reason));
        }

        Ok(Session::new(client, response.final_url))
    }

    async fn enumerate_targets(
        &self,
        _session: &Session,
        _requested: Option<&[String]>,
    ) -> Enumeration {
        let entry = self.dashboard_entry();
        Enumeration {
            targets: vec![TargetDescriptor {
                code: entry.code,
                name: entry.name,
                url: self.dashboard_url.clone(),
            }],
            unknown: Vec::new(),
        }
    }

    async fn fetch_target(&self, session: &Session, target: &TargetDescriptor) -> LocationResult {
        fetch_page(&self.fetcher, session, target).await
    }
}
