//! Recording reporter

use std::sync::{Mutex, PoisonError};

use super::Reporter;
use crate::error::CaseError;
use crate::models::{Label, RunSummary, Value};

/// One reported event
#[derive(Clone, Debug, PartialEq)]
pub enum ReportEvent {
    Pass(Label),
    Fail { label: Label, message: String },
    Final(RunSummary),
}

/// Keeps every event in arrival order
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Labels of passed cases, in completion order
    pub fn passed(&self) -> Vec<Label> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Pass(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    /// Labels of failed cases, in completion order
    pub fn failed(&self) -> Vec<Label> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Fail { label, .. } => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn finals(&self) -> Vec<RunSummary> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Final(summary) => Some(summary),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Reporter for MemoryReporter {
    fn format_assert_err(&self, actual: &Value, expected: &Value) -> String {
        format!("{actual} !== {expected}")
    }

    fn log_pass(&self, label: &Label, _elapsed_ms: u64) {
        self.push(ReportEvent::Pass(label.clone()));
    }

    fn log_fail(&self, label: &Label, error: &CaseError, _elapsed_ms: u64) {
        self.push(ReportEvent::Fail {
            label: label.clone(),
            message: error.to_string(),
        });
    }

    fn log_final(&self, summary: &RunSummary) {
        self.push(ReportEvent::Final(*summary));
    }
}
