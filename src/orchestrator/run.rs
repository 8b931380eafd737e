//! Orchestrator run loop

use crate::adapter::{normalize_codes, Layout, SiteAdapter};
use crate::model::{LocationResult, LogEvent, PageData, ScrapeData, ScrapeResult};
use crate::orchestrator::log::RunLog;
use crate::orchestrator::{ScrapeRequest, ValidationError};
use crate::state::RunState;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tokio::sync::mpsc::UnboundedSender;

/// Runs one scrape against a site adapter
///
/// The orchestrator holds no state between runs; every call re-authenticates.
pub struct Orchestrator<'a> {
    adapter: &'a dyn SiteAdapter,
    max_concurrent: usize,
    log_stream: Option<UnboundedSender<LogEvent>>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator fetching at most `max_concurrent` targets at once
    pub fn new(adapter: &'a dyn SiteAdapter, max_concurrent: usize) -> Self {
        Self {
            adapter,
            max_concurrent: max_concurrent.max(1),
            log_stream: None,
        }
    }

    /// Forwards every log event to `sender` as it is appended
    pub fn with_log_stream(mut self, sender: UnboundedSender<LogEvent>) -> Self {
        self.log_stream = Some(sender);
        self
    }

    /// Executes the run and returns its result
    ///
    /// `success` is false only when validation or authentication failed;
    /// per-target failures are reported inside the data.
    pub async fn run(&self, request: &ScrapeRequest) -> ScrapeResult {
        let adapter = self.adapter;
        let mut log = RunLog::new(adapter.portal(), self.log_stream.clone());
        let mut state = RunState::Start;

        log.info(format!("Connecting to {}...", adapter.label()));

        if let Err(err) = self.validate(request) {
            log.error(format!("Validation failed: {}", err));
            advance(&mut state, RunState::Failed);
            return ScrapeResult::failed(log.into_events(), err.to_string());
        }

        advance(&mut state, RunState::Authenticating);
        log.info(format!(
            "Logging in as {}...",
            request.credential.identifier.trim()
        ));

        let session = match adapter.authenticate(&request.credential).await {
            Ok(session) => {
                log.success("Login successful!");
                session
            }
            Err(err) => {
                log.error(format!("Login failed: {}", err));
                advance(&mut state, RunState::Failed);
                return ScrapeResult::failed(log.into_events(), err.to_string());
            }
        };

        advance(&mut state, RunState::FetchingTargets);
        // Single-document portals have nothing to select.
        let requested = match adapter.layout() {
            Layout::SingleDocument => None,
            Layout::MultiLocation => request.targets.as_deref(),
        };
        let enumeration = adapter.enumerate_targets(&session, requested).await;

        for code in &enumeration.unknown {
            log.info(format!("{}: unknown location, skipped", code));
        }

        let total = enumeration.targets.len();
        match adapter.layout() {
            Layout::SingleDocument => match enumeration.targets.first() {
                Some(target) => log.info(format!("Fetching {}...", target.name)),
                None => log.info(format!("Fetching {} document...", adapter.label())),
            },
            Layout::MultiLocation => log.info(format!("Scraping {} locations...", total)),
        }

        let mut fetches = stream::iter(enumeration.targets.iter())
            .map(|target| adapter.fetch_target(&session, target))
            .buffer_unordered(self.max_concurrent);

        let mut results: BTreeMap<String, LocationResult> = BTreeMap::new();
        while let Some(result) = fetches.next().await {
            match &result.error {
                None => log.success(format!(
                    "{}: {} tables, {} links",
                    result.location_code,
                    result.tables.len(),
                    result.links.len()
                )),
                Some(err) => log.error(format!("{}: {}", result.location_code, err)),
            }
            results.insert(result.location_code.clone(), result);
        }
        drop(fetches);

        advance(&mut state, RunState::Aggregating);
        let succeeded = results.values().filter(|r| r.is_success()).count();
        let data = match adapter.layout() {
            Layout::SingleDocument => ScrapeData::Page(
                results
                    .into_values()
                    .next()
                    .map(PageData::from)
                    .unwrap_or_else(|| PageData {
                        error: Some("no document was fetched".to_string()),
                        ..PageData::default()
                    }),
            ),
            Layout::MultiLocation => {
                log.info(format!("{} of {} locations succeeded", succeeded, total));
                ScrapeData::Locations(results)
            }
        };

        log.success("Scraping complete!");
        advance(&mut state, RunState::Done);

        ScrapeResult::completed(log.into_events(), data)
    }

    fn validate(&self, request: &ScrapeRequest) -> Result<(), ValidationError> {
        if request.portal != self.adapter.portal() {
            return Err(ValidationError::PortalMismatch {
                requested: request.portal,
                adapter: self.adapter.portal(),
            });
        }

        if !request.credential.is_complete() {
            return Err(ValidationError::MissingCredential);
        }

        if self.adapter.layout() == Layout::MultiLocation {
            if let Some(targets) = &request.targets {
                if normalize_codes(targets).is_empty() {
                    return Err(ValidationError::EmptyTargetSelection);
                }
            }
        }

        Ok(())
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid run transition {} -> {}",
        state,
        next
    );
    tracing::debug!(from = %state, to = %next, "Run state transition");
    *state = next;
}
