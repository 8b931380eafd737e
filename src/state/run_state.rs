/// Run state definitions for one scrape invocation
///
/// This module defines the states an orchestrator run moves through.
use std::fmt;

/// Represents the current state of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    // ===== Active States =====
    /// Request received, not yet validated
    Start,

    /// Login handshake in progress
    Authenticating,

    /// Targets are being resolved and fetched
    FetchingTargets,

    /// All target fetches have completed; the result is being assembled
    Aggregating,

    // ===== Terminal States =====
    /// The run produced a result (individual targets may still have failed)
    Done,

    /// The run stopped before any target was attempted
    Failed,
}

impl RunState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is allowed
    ///
    /// ```text
    /// Start -> Authenticating -> FetchingTargets -> Aggregating -> Done
    /// Start | Authenticating -> Failed
    /// ```
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::Authenticating)
                | (Self::Start, Self::Failed)
                | (Self::Authenticating, Self::FetchingTargets)
                | (Self::Authenticating, Self::Failed)
                | (Self::FetchingTargets, Self::Aggregating)
                | (Self::Aggregating, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Authenticating => "authenticating",
            Self::FetchingTargets => "fetching_targets",
            Self::Aggregating => "aggregating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
