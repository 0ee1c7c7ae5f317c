//! # Request Workflow State Machine
//!
//! Tracks where a transcription job is in its lifecycle, mirroring the
//! screens a client steps through:
//!
//! ## Lifecycle:
//! 1. **Idle**: nothing in progress
//! 2. **Recording / Paused**: live capture on the client
//! 3. **Uploading**: audio being received and encoded
//! 4. **Processing**: the gateway is rotating through candidates
//! 5. **Completed / Error**: terminal until reset back to Idle
//!
//! Transitions are checked; an illegal move is reported instead of applied.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppStatus {
    Idle,
    Recording,
    Paused,
    Uploading,
    Processing,
    Completed,
    Error,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Idle => "IDLE",
            AppStatus::Recording => "RECORDING",
            AppStatus::Paused => "PAUSED",
            AppStatus::Uploading => "UPLOADING",
            AppStatus::Processing => "PROCESSING",
            AppStatus::Completed => "COMPLETED",
            AppStatus::Error => "ERROR",
        }
    }

    /// Whether moving from `self` to `next` is allowed. Reset to Idle is
    /// always allowed.
    pub fn can_transition_to(&self, next: AppStatus) -> bool {
        use AppStatus::*;

        matches!(
            (*self, next),
            (_, Idle)
                | (Idle, Recording)
                | (Idle, Uploading)
                | (Recording, Paused)
                | (Paused, Recording)
                | (Recording, Uploading)
                | (Paused, Uploading)
                | (Uploading, Processing)
                | (Uploading, Error)
                | (Processing, Completed)
                | (Processing, Error)
        )
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid workflow transition from {from} to {to}")]
pub struct TransitionError {
    pub from: AppStatus,
    pub to: AppStatus,
}

/// One job's current status, its error message (if any) and the path taken.
#[derive(Debug, Clone)]
pub struct Workflow {
    status: AppStatus,
    error: Option<String>,
    history: Vec<AppStatus>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            status: AppStatus::Idle,
            error: None,
            history: vec![AppStatus::Idle],
        }
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn history(&self) -> &[AppStatus] {
        &self.history
    }

    pub fn transition(&mut self, next: AppStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }

        if next == AppStatus::Idle {
            self.error = None;
        }
        self.status = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to Error and remember why.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(AppStatus::Error)?;
        self.error = Some(message.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_happy_path() {
        let mut workflow = Workflow::new();
        workflow.transition(AppStatus::Uploading).unwrap();
        workflow.transition(AppStatus::Processing).unwrap();
        workflow.transition(AppStatus::Completed).unwrap();

        assert_eq!(workflow.status(), AppStatus::Completed);
        assert_eq!(
            workflow.history(),
            &[
                AppStatus::Idle,
                AppStatus::Uploading,
                AppStatus::Processing,
                AppStatus::Completed
            ]
        );
    }

    #[test]
    fn test_recording_can_pause_and_resume() {
        let mut workflow = Workflow::new();
        workflow.transition(AppStatus::Recording).unwrap();
        workflow.transition(AppStatus::Paused).unwrap();
        workflow.transition(AppStatus::Recording).unwrap();
        workflow.transition(AppStatus::Uploading).unwrap();
        assert_eq!(workflow.status(), AppStatus::Uploading);
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let mut workflow = Workflow::new();
        let err = workflow.transition(AppStatus::Completed).unwrap_err();
        assert_eq!(err.from, AppStatus::Idle);
        assert_eq!(err.to, AppStatus::Completed);
        assert_eq!(workflow.status(), AppStatus::Idle);
        assert!(err.to_string().contains("IDLE"));
    }

    #[test]
    fn test_fail_and_reset() {
        let mut workflow = Workflow::new();
        workflow.transition(AppStatus::Uploading).unwrap();
        workflow.transition(AppStatus::Processing).unwrap();
        workflow.fail("all candidates exhausted").unwrap();
        assert_eq!(workflow.status(), AppStatus::Error);
        assert_eq!(workflow.error(), Some("all candidates exhausted"));

        workflow.transition(AppStatus::Idle).unwrap();
        assert_eq!(workflow.status(), AppStatus::Idle);
        assert!(workflow.error().is_none());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&AppStatus::Processing).unwrap(), "\"PROCESSING\"");
    }
}
