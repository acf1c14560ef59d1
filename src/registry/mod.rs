//! Case registry
//!
//! Holds registered cases in registration order. Each record owns its
//! closure until the first invocation claims it, which is what makes a
//! case execute at most once.

mod group;

pub use group::Group;

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CaseResult;
use crate::executor::CaseContext;
use crate::models::Label;

pub(crate) type CaseFuture = BoxFuture<'static, CaseResult>;
pub(crate) type CaseFn = Box<dyn FnOnce(CaseContext) -> CaseFuture + Send>;

/// A registered case and its bookkeeping
pub struct CaseRecord {
    label: Label,
    closure: Mutex<Option<CaseFn>>,
    tested: AtomicBool,
}

impl CaseRecord {
    pub(crate) fn new(label: Label, closure: CaseFn) -> Self {
        Self {
            label,
            closure: Mutex::new(Some(closure)),
            tested: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Whether the case has actually executed
    pub fn is_tested(&self) -> bool {
        self.tested.load(Ordering::Acquire)
    }

    /// Whether the closure is still waiting for its first invocation
    pub fn is_pending(&self) -> bool {
        self.closure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Take the closure; only the first caller gets it
    pub(crate) fn claim(&self) -> Option<CaseFn> {
        self.closure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn mark_tested(&self) {
        self.tested.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for CaseRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseRecord")
            .field("label", &self.label)
            .field("tested", &self.is_tested())
            .finish()
    }
}

/// Registered cases in registration order
#[derive(Debug, Default)]
pub struct Registry {
    cases: Mutex<Vec<Arc<CaseRecord>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, record: CaseRecord) -> Arc<CaseRecord> {
        let record = Arc::new(record);
        self.cases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        record
    }

    /// Case at `index` in registration order
    pub fn get(&self, index: usize) -> Option<Arc<CaseRecord>> {
        self.cases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> Vec<Label> {
        self.cases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|record| record.label().clone())
            .collect()
    }
}
