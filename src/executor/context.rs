//! Per-case context handed to every case closure

use std::future::IntoFuture;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

use crate::equality::Assertion;
use crate::error::CaseResult;
use crate::models::{Label, Value};
use crate::monitor::payload_message;

type AfterHook = Box<dyn FnOnce() + Send>;

/// Cleanups registered by a case, run once it settles
#[derive(Clone, Default)]
pub(crate) struct AfterHooks {
    hooks: Arc<Mutex<Vec<AfterHook>>>,
}

impl AfterHooks {
    fn push(&self, hook: AfterHook) {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    /// Run hooks in registration order; a panicking hook is logged and skipped
    pub(crate) fn run_all(&self, label: &Label) {
        let hooks = std::mem::take(&mut *self.hooks.lock().unwrap_or_else(PoisonError::into_inner));
        for hook in hooks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(hook)) {
                warn!(
                    "After hook of '{}' panicked: {}",
                    label,
                    payload_message(payload.as_ref())
                );
            }
        }
    }
}

/// What a case closure can see and do
pub struct CaseContext {
    label: Label,
    assertion: Assertion,
    after: AfterHooks,
}

impl CaseContext {
    pub(crate) fn new(label: Label, assertion: Assertion, after: AfterHooks) -> Self {
        Self {
            label,
            assertion,
            after,
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Register a cleanup to run after the case settles, pass or fail
    pub fn after(&self, hook: impl FnOnce() + Send + 'static) {
        self.after.push(Box::new(hook));
    }

    /// Deep equality with the default depth budget
    pub fn eq(&self, actual: impl Into<Value>, expected: impl Into<Value>) -> CaseResult {
        self.assertion.check(actual, expected)
    }

    /// Deep equality with an explicit depth budget
    pub fn eq_depth(
        &self,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
        max_depth: usize,
    ) -> CaseResult {
        self.assertion.check_depth(actual, expected, max_depth)
    }

    /// Deep equality where either side is still being computed
    pub async fn eq_async<A, B>(&self, actual: A, expected: B) -> CaseResult
    where
        A: IntoFuture,
        A::Output: Into<Value>,
        B: IntoFuture,
        B::Output: Into<Value>,
    {
        self.assertion.check_async(actual, expected).await
    }

    pub fn assertion(&self) -> &Assertion {
        &self.assertion
    }
}

impl std::fmt::Debug for CaseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseContext")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
