//! # Progress Reporting
//!
//! Observational sink for short status strings ("Attempting <model>",
//! "Synthesizing French translation"). Reporting happens synchronously as the
//! gateway advances and stops before the outcome is returned; removing the
//! sink changes nothing else.

use std::sync::{Mutex, PoisonError};
use tracing::debug;

pub trait ProgressReporter: Send + Sync {
    fn report(&self, status: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, status: &str) {
        self(status)
    }
}

/// Collects every status string for a single request so handlers can echo
/// them back to the caller.
#[derive(Debug, Default)]
pub struct ProgressLog {
    entries: Mutex<Vec<String>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressReporter for ProgressLog {
    fn report(&self, status: &str) {
        debug!(status = %status, "Progress");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(status.to_string());
    }
}
