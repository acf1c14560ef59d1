//! Reporter contract
//!
//! The scheduler only ever calls into a [`Reporter`]; how events are
//! rendered is up to the implementation.
//!
//! - [`ConsoleReporter`]: prompt-prefixed lines on stdout/stderr
//! - [`ReporterOverrides`]: per-event closures merged over a base reporter
//! - [`MemoryReporter`]: records events for inspection

mod console;
mod memory;
mod overrides;

pub use console::{ConsoleReporter, DEFAULT_PROMPT};
pub use memory::{MemoryReporter, ReportEvent};
pub use overrides::ReporterOverrides;

use crate::error::CaseError;
use crate::models::{Label, RunSummary, Value};

/// Sink for case events
///
/// The suite calls `log_pass`, `log_fail` and `log_final` while holding its
/// run-state lock, so an implementation must not call back into the suite
/// (for example `Suite::snapshot`); doing so deadlocks. A panic inside a
/// reporter call is caught and logged and does not affect the run.
pub trait Reporter: Send + Sync {
    /// Render an assertion mismatch between two values
    fn format_assert_err(&self, actual: &Value, expected: &Value) -> String;

    fn log_pass(&self, label: &Label, elapsed_ms: u64);

    fn log_fail(&self, label: &Label, error: &CaseError, elapsed_ms: u64);

    /// Called exactly once per run
    fn log_final(&self, summary: &RunSummary);
}

/// Indent every line of `text` by two spaces
pub(crate) fn indent(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\nb"), "  a\n  b");
        assert_eq!(indent(""), "  ");
    }
}
