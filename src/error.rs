//! Error types for fixture setup and case execution.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while preparing a fixture for a case.
///
/// None of these are raised at declaration time. They surface when the runner executes the setup step of a case and
/// are recorded against that case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureError {
    #[error("suite '{suite}' has no fixture configuration (call inject() before run())")]
    NotInjected { suite: String },

    #[error("fixture configuration has no subject under test")]
    MissingSubject,

    #[error("no fixture was prepared for this case")]
    NotPrepared,

    #[error("environment setup failed: {0}")]
    Setup(String),

    #[error("fixture construction failed: {0}")]
    Construction(String),
}

/// Why a single case failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseFailure {
    #[error("{0}")]
    Panicked(String),

    #[error("setup failed: {0}")]
    Setup(#[from] FixtureError),

    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("async runtime unavailable: {0}")]
    Runtime(String),
}

impl CaseFailure {
    /// Build a failure from a panic payload captured by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "case panicked with a non-string payload".to_string()
        };
        CaseFailure::Panicked(message)
    }
}
