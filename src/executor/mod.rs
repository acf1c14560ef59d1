//! Case execution engine
//!
//! A [`Suite`] owns the registered cases and schedules them with a
//! bounded number in flight. Each case can also be invoked directly
//! through its [`CaseHandle`].

mod case;
mod context;
mod runner;
mod state;

pub use case::CaseHandle;
pub use context::CaseContext;
pub use runner::{CaseFilter, Limit, Suite, SuiteBuilder};

pub(crate) use runner::SuiteInner;
