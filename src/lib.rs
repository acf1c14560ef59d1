//! async-junit - minimal async test-execution core
//!
//! Two pieces that work together:
//!
//! - a scheduler that runs registered async cases with bounded
//!   concurrency, per-case timeouts, bail-on-first-failure, label
//!   filtering and unhandled-failure accounting, reporting through a
//!   pluggable [`Reporter`]
//! - an equality engine that compares two [`Value`] trees structurally
//!   with a depth budget and points at the first divergence
//!
//! ## Usage
//!
//! ```no_run
//! use async_junit::{CaseContext, Limit, Suite, Value};
//!
//! # async fn demo() -> Result<(), async_junit::RunError> {
//! let suite = Suite::new();
//!
//! suite.register("adds", |ctx: CaseContext| async move { ctx.eq(1 + 1, 2) });
//! suite.describe("user", |group| {
//!     group.register("shape", |ctx: CaseContext| async move {
//!         ctx.eq(Value::map([("id", 1)]), Value::map([("id", 1)]))
//!     });
//! });
//!
//! let summary = suite.run(Limit::bounded(4)).await?;
//! assert!(summary.is_all_passed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod equality;
pub mod error;
pub mod executor;
pub mod models;
pub mod monitor;
pub mod registry;
pub mod reporter;
pub mod utils;

pub use config::{EnvConfig, SuiteConfig};
pub use equality::{compare, Assertion, Comparison, DEFAULT_MAX_DEPTH};
pub use error::{CaseError, CaseResult, RunError};
pub use executor::{CaseContext, CaseHandle, Limit, Suite, SuiteBuilder};
pub use models::{CaseOutcome, Label, RunPhase, RunSummary, Value};
pub use monitor::{UnhandledFailure, UnhandledSource};
pub use reporter::{ConsoleReporter, MemoryReporter, Reporter, ReporterOverrides};
pub use utils::{init_logger, LogLevel};
