//! Run counters and lifecycle flags

use crate::models::{RunPhase, RunSummary};

/// Mutable bookkeeping owned by a suite
#[derive(Debug)]
pub(crate) struct RunState {
    pub phase: RunPhase,
    /// Set by bail or by finalisation; nothing is reported afterwards
    pub ended: bool,
    pub tested: usize,
    pub passed: usize,
    pub failed: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Pending,
            ended: false,
            tested: 0,
            passed: 0,
            failed: 0,
        }
    }

    pub fn summary(&self, total: usize) -> RunSummary {
        RunSummary::new(total, self.tested, self.passed, self.failed)
    }

    /// Pending -> Running; any other phase means the suite already ran
    pub fn begin(&mut self) -> Result<(), RunPhase> {
        match self.phase {
            RunPhase::Pending => {
                self.phase = RunPhase::Running;
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Running -> Bailed | Exhausted, once scheduling stops
    pub fn stop_pulling(&mut self) {
        if self.phase == RunPhase::Running {
            self.phase = if self.ended {
                RunPhase::Bailed
            } else {
                RunPhase::Exhausted
            };
        }
    }

    pub fn finish(&mut self) {
        self.phase = RunPhase::Final;
        self.ended = true;
    }
}
