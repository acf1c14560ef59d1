//! Single case execution
//!
//! A case runs as its own tokio task inside the tracked-case scope and is
//! raced against the suite timeout. On timeout the task is detached, not
//! aborted: it may keep running, but its result is never observed.

use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, warn};

use super::context::{AfterHooks, CaseContext};
use super::SuiteInner;
use crate::error::CaseError;
use crate::models::{CaseOutcome, Label};
use crate::monitor::{self, payload_message};
use crate::registry::CaseRecord;
use crate::utils::Timer;

/// Invocable reference to a registered case
#[derive(Clone)]
pub struct CaseHandle {
    record: Arc<CaseRecord>,
    suite: Arc<SuiteInner>,
}

impl CaseHandle {
    pub(crate) fn new(record: Arc<CaseRecord>, suite: Arc<SuiteInner>) -> Self {
        Self { record, suite }
    }

    pub fn label(&self) -> &Label {
        self.record.label()
    }

    pub fn is_tested(&self) -> bool {
        self.record.is_tested()
    }

    /// Execute the case. Only the first invocation runs the closure; later
    /// ones resolve to [`CaseOutcome::AlreadyRun`].
    pub async fn invoke(&self) -> CaseOutcome {
        execute(self.suite.clone(), self.record.clone()).await
    }

    pub(crate) fn belongs_to(&self, suite: &Arc<SuiteInner>) -> bool {
        Arc::ptr_eq(&self.suite, suite)
    }

    pub(crate) fn into_execution(self) -> impl std::future::Future<Output = CaseOutcome> + Send {
        execute(self.suite, self.record)
    }
}

impl std::fmt::Debug for CaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseHandle")
            .field("label", self.label())
            .field("tested", &self.is_tested())
            .finish()
    }
}

async fn execute(suite: Arc<SuiteInner>, record: Arc<CaseRecord>) -> CaseOutcome {
    let label = record.label().clone();

    let Some(closure) = record.claim() else {
        debug!("Case '{}' already ran", label);
        return CaseOutcome::AlreadyRun;
    };

    if !suite.accepts(&label) {
        debug!("Case '{}' excluded by filter", label);
        return CaseOutcome::Filtered;
    }

    if !suite.start_case() {
        debug!("Run has ended, not starting '{}'", label);
        return CaseOutcome::Suppressed;
    }
    record.mark_tested();

    debug!("Starting '{}'", label);
    let timer = Timer::start(label.to_string());
    let hooks = AfterHooks::default();
    let ctx = CaseContext::new(label.clone(), suite.assertion(), hooks.clone());

    let task = tokio::spawn(monitor::track(async move { closure(ctx).await }));
    let timeout = suite.timeout();

    let result = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => Err(thrown_from_join(err)),
        Err(_) => {
            warn!("Case '{}' timed out after {}ms", label, timeout.as_millis());
            Err(CaseError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    };

    hooks.run_all(&label);
    let elapsed_ms = timer.stop();

    suite.settle(&label, result, elapsed_ms)
}

fn thrown_from_join(err: JoinError) -> CaseError {
    if err.is_panic() {
        CaseError::Thrown {
            message: payload_message(err.into_panic().as_ref()),
        }
    } else {
        CaseError::Thrown {
            message: "case task was cancelled".to_string(),
        }
    }
}
