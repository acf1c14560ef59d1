//! Data models for the test engine
//!
//! Value trees, case labels and run bookkeeping types.

mod label;
mod summary;
mod value;

pub use label::Label;
pub use summary::{CaseOutcome, RunPhase, RunSummary};
pub use value::Value;
