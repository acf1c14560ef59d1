//! Environment variable configuration
//!
//! Provides environment variable overrides for suite options.

use std::env;

use super::SuiteConfig;

/// Environment variable prefix
const ENV_PREFIX: &str = "JUNIT";

/// Suite overrides read from `JUNIT_*` variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Bail from JUNIT_BAIL
    pub bail: Option<bool>,
    /// Timeout in ms from JUNIT_TIMEOUT
    pub timeout_ms: Option<u64>,
    /// Concurrency limit from JUNIT_LIMIT
    pub limit: Option<usize>,
    /// Label filter from JUNIT_GREP
    pub grep: Option<String>,
    /// Throw on final from JUNIT_THROW_ON_FINAL
    pub throw_on_final: Option<bool>,
    /// Unhandled failure counting from JUNIT_FAIL_ON_UNHANDLED
    pub fail_on_unhandled: Option<bool>,
    /// Reporter prompt from JUNIT_PROMPT
    pub prompt: Option<String>,
    /// Config file from JUNIT_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));
        let get_parse = |name: &str| get(name).and_then(|v| v.trim().parse().ok());

        Self {
            bail: get("BAIL").map(|v| parse_bool(&v)),
            timeout_ms: get_parse("TIMEOUT"),
            limit: get_parse("LIMIT").map(|v: u64| v as usize),
            grep: get("GREP"),
            throw_on_final: get("THROW_ON_FINAL").map(|v| parse_bool(&v)),
            fail_on_unhandled: get("FAIL_ON_UNHANDLED").map(|v| parse_bool(&v)),
            prompt: get("PROMPT"),
            config_file: get("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.bail.is_some()
            || self.timeout_ms.is_some()
            || self.limit.is_some()
            || self.grep.is_some()
            || self.throw_on_final.is_some()
            || self.fail_on_unhandled.is_some()
            || self.prompt.is_some()
            || self.config_file.is_some()
    }

    /// Overlay the variables that are set onto `config`
    pub fn apply(&self, mut config: SuiteConfig) -> SuiteConfig {
        if let Some(bail) = self.bail {
            config.bail = bail;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(limit) = self.limit {
            config.limit = Some(limit);
        }
        if let Some(grep) = &self.grep {
            config.grep = Some(grep.clone());
        }
        if let Some(throw_on_final) = self.throw_on_final {
            config.throw_on_final = throw_on_final;
        }
        if let Some(fail_on_unhandled) = self.fail_on_unhandled {
            config.fail_on_unhandled = fail_on_unhandled;
        }
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
        }
        config
    }
}

/// Interpret an environment value as a boolean
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}
