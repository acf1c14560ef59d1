//! Configuration module
//!
//! Suite options, loadable from YAML/JSON files and overridable through
//! `JUNIT_*` environment variables.

mod env;

pub use env::EnvConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::executor::Limit;
use crate::reporter::DEFAULT_PROMPT;

/// Default per-case timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Options recognised by a suite
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Stop scheduling after the first failure
    pub bail: bool,

    /// Count failures reported to the unhandled-failure source
    pub fail_on_unhandled: bool,

    /// Turn a run with failures into an error after reporting
    pub throw_on_final: bool,

    /// Per-case timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum cases in flight; `None` runs everything at once
    pub limit: Option<usize>,

    /// Only run cases whose rendered label matches this regex
    pub grep: Option<String>,

    /// Prompt prefix for the console reporter
    pub prompt: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            bail: false,
            fail_on_unhandled: true,
            throw_on_final: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            limit: None,
            grep: None,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Self = if is_yaml(path.as_ref()) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = if is_yaml(path.as_ref()) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Defaults, then the `JUNIT_CONFIG` file if set, then `JUNIT_*` overrides
    pub fn from_env() -> Result<Self> {
        let env = EnvConfig::load();
        let base = match &env.config_file {
            Some(path) => Self::load(path)
                .with_context(|| format!("Failed to load JUNIT_CONFIG={path}"))?,
            None => Self::default(),
        };
        Ok(env.apply(base))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn limit(&self) -> Limit {
        self.limit.map_or(Limit::Unbounded, Limit::bounded)
    }

    pub fn with_bail(mut self, bail: bool) -> Self {
        self.bail = bail;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_throw_on_final(mut self, throw_on_final: bool) -> Self {
        self.throw_on_final = throw_on_final;
        self
    }

    pub fn with_fail_on_unhandled(mut self, fail_on_unhandled: bool) -> Self {
        self.fail_on_unhandled = fail_on_unhandled;
        self
    }

    pub fn with_grep(mut self, grep: impl Into<String>) -> Self {
        self.grep = Some(grep.into());
        self
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
