//! Run log
//!
//! Collects the ordered [`LogEvent`] trail of one run, mirrors each entry to
//! `tracing` and optionally forwards it to a live channel.

use crate::adapter::Portal;
use crate::model::{LogEvent, LogKind};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug)]
pub(crate) struct RunLog {
    portal: Portal,
    events: Vec<LogEvent>,
    stream: Option<UnboundedSender<LogEvent>>,
}

impl RunLog {
    pub(crate) fn new(portal: Portal, stream: Option<UnboundedSender<LogEvent>>) -> Self {
        Self {
            portal,
            events: Vec::new(),
            stream,
        }
    }

    pub(crate) fn info(&mut self, message: impl Into<String>) {
        self.push(LogEvent::info(message));
    }

    pub(crate) fn success(&mut self, message: impl Into<String>) {
        self.push(LogEvent::success(message));
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.push(LogEvent::error(message));
    }

    fn push(&mut self, event: LogEvent) {
        match event.kind {
            LogKind::Info | LogKind::Success => {
                tracing::info!(portal = %self.portal, kind = %event.kind, "{}", event.message)
            }
            LogKind::Error => {
                tracing::warn!(portal = %self.portal, kind = %event.kind, "{}", event.message)
            }
        }

        // A dropped receiver stops forwarding; the buffered trail is unaffected.
        let closed = self
            .stream
            .as_ref()
            .map_or(false, |tx| tx.send(event.clone()).is_err());
        if closed {
            tracing::debug!("Log stream receiver dropped");
            self.stream = None;
        }

        self.events.push(event);
    }

    pub(crate) fn into_events(self) -> Vec<LogEvent> {
        self.events
    }
}
