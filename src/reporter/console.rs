//! Console reporter
//!
//! Writes prompt-prefixed pass lines to stdout, failures to stderr.

use std::io::Write;

use super::{indent, Reporter};
use crate::error::CaseError;
use crate::models::{Label, RunSummary, Value};

/// Default prompt prefix
pub const DEFAULT_PROMPT: &str = "junit >";

/// Plain-text reporter
#[derive(Clone, Debug)]
pub struct ConsoleReporter {
    prompt: String,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn format_pass(&self, label: &Label, elapsed_ms: u64) -> String {
        format!("{} o {} ({}ms)", self.prompt, label, elapsed_ms)
    }

    pub fn format_fail(&self, label: &Label, error: &CaseError, elapsed_ms: u64) -> String {
        format!(
            "{} x {} ({}ms)\n{}\n",
            self.prompt,
            label,
            elapsed_ms,
            indent(&error.to_string())
        )
    }

    pub fn format_final(&self, summary: &RunSummary) -> String {
        format!(
            "{pt} tested {} / {}\n{pt} passed {}\n{pt} failed {}",
            summary.tested,
            summary.total,
            summary.passed,
            summary.failed,
            pt = self.prompt
        )
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn format_assert_err(&self, actual: &Value, expected: &Value) -> String {
        indent(&format!(
            "\n<<<<<<< actual\n{}\n=======\n{}\n>>>>>>> expected\n",
            render(actual),
            render(expected)
        ))
    }

    fn log_pass(&self, label: &Label, elapsed_ms: u64) {
        let line = self.format_pass(label, elapsed_ms);
        let _ = writeln!(std::io::stdout().lock(), "{line}");
    }

    fn log_fail(&self, label: &Label, error: &CaseError, elapsed_ms: u64) {
        let block = self.format_fail(label, error, elapsed_ms);
        let _ = writeln!(std::io::stderr().lock(), "{block}");
    }

    fn log_final(&self, summary: &RunSummary) {
        let block = self.format_final(summary);
        let _ = writeln!(std::io::stdout().lock(), "{block}");
    }
}

/// Strings are shown verbatim, everything else pretty-printed
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.render_pretty(),
    }
}
