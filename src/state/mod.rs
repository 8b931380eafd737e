//! State module for tracking scrape run progress
//!
//! # Components
//!
//! - `RunState`: The state machine of one orchestrator invocation
//!   (start, authenticating, fetching targets, aggregating, done, failed)

mod run_state;

pub use run_state::RunState;
