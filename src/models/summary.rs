//! Run summary, run phases and per-invocation outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CaseError;

/// Counters frozen at the end of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Cases registered
    pub total: usize,
    /// Cases actually executed
    pub tested: usize,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn new(total: usize, tested: usize, passed: usize, failed: usize) -> Self {
        Self {
            total,
            tested,
            passed,
            failed,
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn pass_rate(&self) -> f64 {
        if self.tested == 0 {
            0.0
        } else {
            (self.passed as f64 / self.tested as f64) * 100.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Tested: {} | Pass: {} | Fail: {}",
            self.total, self.tested, self.passed, self.failed
        )
    }
}

/// Lifecycle of a suite's run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Pending,
    Running,
    /// A failure stopped scheduling; in-flight cases are settling
    Bailed,
    /// Every case was pulled; in-flight cases are settling
    Exhausted,
    Final,
}

impl RunPhase {
    /// The run has stopped pulling new cases
    pub fn is_draining(&self) -> bool {
        matches!(self, RunPhase::Bailed | RunPhase::Exhausted)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Pending => write!(f, "pending"),
            RunPhase::Running => write!(f, "running"),
            RunPhase::Bailed => write!(f, "bailed"),
            RunPhase::Exhausted => write!(f, "exhausted"),
            RunPhase::Final => write!(f, "final"),
        }
    }
}

/// What a single invocation of a case observed
#[derive(Clone, Debug)]
pub enum CaseOutcome {
    Passed { elapsed_ms: u64 },
    Failed { error: CaseError, elapsed_ms: u64 },
    /// Excluded by the suite filter; counted in `total` only
    Filtered,
    /// The case had already been executed by an earlier invocation
    AlreadyRun,
    /// The run had ended; the result was not counted or reported
    Suppressed,
}

impl CaseOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CaseOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&CaseError> {
        match self {
            CaseOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
