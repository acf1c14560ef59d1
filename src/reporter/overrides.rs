//! Per-event reporter overrides
//!
//! Each field is optional and falls back to the base reporter on its own.

use std::fmt;
use std::sync::Arc;

use super::{ConsoleReporter, Reporter};
use crate::error::CaseError;
use crate::models::{Label, RunSummary, Value};

type FormatFn = Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>;
type PassFn = Arc<dyn Fn(&Label, u64) + Send + Sync>;
type FailFn = Arc<dyn Fn(&Label, &CaseError, u64) + Send + Sync>;
type FinalFn = Arc<dyn Fn(&RunSummary) + Send + Sync>;

/// A reporter assembled from optional closures over a base reporter
#[derive(Clone)]
pub struct ReporterOverrides {
    base: Arc<dyn Reporter>,
    pub format_assert_err: Option<FormatFn>,
    pub log_pass: Option<PassFn>,
    pub log_fail: Option<FailFn>,
    pub log_final: Option<FinalFn>,
}

impl ReporterOverrides {
    /// Overrides on top of the default console reporter
    pub fn new() -> Self {
        Self::over(Arc::new(ConsoleReporter::new()))
    }

    /// Overrides on top of an arbitrary reporter
    pub fn over(base: Arc<dyn Reporter>) -> Self {
        Self {
            base,
            format_assert_err: None,
            log_pass: None,
            log_fail: None,
            log_final: None,
        }
    }

    pub fn on_format_assert_err(
        mut self,
        f: impl Fn(&Value, &Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.format_assert_err = Some(Arc::new(f));
        self
    }

    pub fn on_pass(mut self, f: impl Fn(&Label, u64) + Send + Sync + 'static) -> Self {
        self.log_pass = Some(Arc::new(f));
        self
    }

    pub fn on_fail(mut self, f: impl Fn(&Label, &CaseError, u64) + Send + Sync + 'static) -> Self {
        self.log_fail = Some(Arc::new(f));
        self
    }

    pub fn on_final(mut self, f: impl Fn(&RunSummary) + Send + Sync + 'static) -> Self {
        self.log_final = Some(Arc::new(f));
        self
    }
}

impl Default for ReporterOverrides {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReporterOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterOverrides")
            .field("format_assert_err", &self.format_assert_err.is_some())
            .field("log_pass", &self.log_pass.is_some())
            .field("log_fail", &self.log_fail.is_some())
            .field("log_final", &self.log_final.is_some())
            .finish()
    }
}

impl Reporter for ReporterOverrides {
    fn format_assert_err(&self, actual: &Value, expected: &Value) -> String {
        match &self.format_assert_err {
            Some(f) => f(actual, expected),
            None => self.base.format_assert_err(actual, expected),
        }
    }

    fn log_pass(&self, label: &Label, elapsed_ms: u64) {
        match &self.log_pass {
            Some(f) => f(label, elapsed_ms),
            None => self.base.log_pass(label, elapsed_ms),
        }
    }

    fn log_fail(&self, label: &Label, error: &CaseError, elapsed_ms: u64) {
        match &self.log_fail {
            Some(f) => f(label, error, elapsed_ms),
            None => self.base.log_fail(label, error, elapsed_ms),
        }
    }

    fn log_final(&self, summary: &RunSummary) {
        match &self.log_final {
            Some(f) => f(summary),
            None => self.base.log_final(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{MemoryReporter, ReportEvent};
    use std::sync::Mutex;

    #[test]
    fn test_each_field_falls_back_independently() {
        let base = Arc::new(MemoryReporter::new());
        let passes = Arc::new(Mutex::new(Vec::new()));
        let sink = passes.clone();

        let reporter = ReporterOverrides::over(base.clone())
            .on_pass(move |label, _| sink.lock().unwrap().push(label.clone()));

        reporter.log_pass(&Label::single("01"), 1);
        reporter.log_final(&RunSummary::new(1, 1, 1, 0));

        assert_eq!(*passes.lock().unwrap(), vec![Label::single("01")]);
        assert_eq!(
            base.events(),
            vec![ReportEvent::Final(RunSummary::new(1, 1, 1, 0))]
        );
    }

    #[test]
    fn test_format_override() {
        let reporter = ReporterOverrides::new().on_format_assert_err(|a, e| format!("{a} != {e}"));
        assert_eq!(
            reporter.format_assert_err(&Value::from(1), &Value::from(2)),
            "1 != 2"
        );
    }
}
