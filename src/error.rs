//! Error types
//!
//! `CaseError` is the failure taxonomy a case can settle with;
//! `RunError` is what a whole run can end with.

use thiserror::Error;

use crate::models::{RunPhase, RunSummary};

/// Why a case failed
#[derive(Clone, Debug, Error)]
pub enum CaseError {
    /// Structural equality mismatch
    #[error("assertion failed at `{path}`:{rendered}")]
    Assertion { path: String, rendered: String },

    #[error("test_timeout: case exceeded {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Panic or error raised by the case itself
    #[error("{message}")]
    Thrown { message: String },

    #[error("unhandled failure: {message}")]
    Unhandled { message: String },

    #[error("Maximum recursion depth exceeded: {max_depth}{rendered}")]
    DepthExceeded { max_depth: usize, rendered: String },
}

impl CaseError {
    /// Failure raised by user code
    pub fn thrown(message: impl Into<String>) -> Self {
        CaseError::Thrown {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CaseError::Assertion { .. } => "assertion",
            CaseError::Timeout { .. } => "timeout",
            CaseError::Thrown { .. } => "thrown",
            CaseError::Unhandled { .. } => "unhandled",
            CaseError::DepthExceeded { .. } => "depth_exceeded",
        }
    }
}

impl From<anyhow::Error> for CaseError {
    fn from(err: anyhow::Error) -> Self {
        CaseError::Thrown {
            message: format!("{err:#}"),
        }
    }
}

impl From<std::io::Error> for CaseError {
    fn from(err: std::io::Error) -> Self {
        CaseError::Thrown {
            message: err.to_string(),
        }
    }
}

/// Result type returned by case closures
pub type CaseResult = std::result::Result<(), CaseError>;

/// Why a run did not return its summary normally
#[derive(Debug, Error)]
pub enum RunError {
    /// The run completed with failures and the suite throws on final.
    /// Reporting has already happened.
    #[error("junit test failed with {failed}")]
    Failed { failed: usize, summary: RunSummary },

    #[error("suite has already been run (phase: {0})")]
    AlreadyStarted(RunPhase),
}

impl RunError {
    /// Summary observed before the error was raised, if any
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunError::Failed { summary, .. } => Some(summary),
            RunError::AlreadyStarted(_) => None,
        }
    }
}
