//! Scrape orchestrator
//!
//! Drives one site adapter through a run:
//! - Validates the request (no network call on failure)
//! - Authenticates once
//! - Fans out target fetches under a concurrency cap
//! - Aggregates per-target outcomes into a [`ScrapeResult`](crate::model::ScrapeResult)
//!   with the complete log trail

mod log;
mod run;

use crate::adapter::Portal;
use crate::model::Credential;
use serde::Deserialize;
use thiserror::Error;

pub use run::Orchestrator;

/// Request rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username and password are required")]
    MissingCredential,

    #[error("at least one location must be selected")]
    EmptyTargetSelection,

    #[error("request is for {requested} but the adapter serves {adapter}")]
    PortalMismatch { requested: Portal, adapter: Portal },
}

/// One scrape invocation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    /// Selects the site adapter
    pub portal: Portal,

    pub credential: Credential,

    /// Requested location codes; `None` selects every known location.
    /// Ignored by single-document portals.
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

impl ScrapeRequest {
    pub fn new(portal: Portal, credential: Credential) -> Self {
        Self {
            portal,
            credential,
            targets: None,
        }
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }
}
