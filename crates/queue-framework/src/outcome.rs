//! # Processing Outcomes
//!
//! The poll loop reports what happened to each message through [`OutcomeRecorder`]. The
//! trait only allows incrementing; reading counts is left to the concrete metrics type so
//! production code cannot reset or inspect them by accident.

use std::fmt::{self, Display};

/// Final classification of a processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The record was persisted. Counted at persist time, before the lease is deleted.
    Success,
    /// The message was rejected by validation or the store write failed.
    Error,
}

impl Outcome {
    pub const ALL: [Outcome; 2] = [Outcome::Success, Outcome::Error];

    /// Label value used in metric series.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Increment-only sink for message outcomes. Must be safe to call from the loop while another
/// task reads the underlying counters.
pub trait OutcomeRecorder: Send + Sync {
    fn record(&self, outcome: Outcome);
}
