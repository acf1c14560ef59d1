//! Hierarchical grouping
//!
//! A [`Group`] carries the label segments of every enclosing `describe`
//! and prefixes them onto the cases registered through it. Grouping has
//! no effect on scheduling.

use std::future::Future;

use crate::error::CaseResult;
use crate::executor::{CaseContext, CaseHandle, Suite};
use crate::models::Label;

/// Registration scope inside `describe`
pub struct Group<'a> {
    suite: &'a Suite,
    path: Vec<String>,
}

impl<'a> Group<'a> {
    pub(crate) fn new(suite: &'a Suite, path: Vec<String>) -> Self {
        Self { suite, path }
    }

    /// Segments of the enclosing groups, outermost first
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Register a case labelled `[..path, message]`
    pub fn register<F, Fut>(&self, message: impl Into<String>, case: F) -> CaseHandle
    where
        F: FnOnce(CaseContext) -> Fut + Send + 'static,
        Fut: Future<Output = CaseResult> + Send + 'static,
    {
        self.suite
            .register(Label::nested(&self.path, message), case)
    }

    /// Open a nested group
    pub fn describe<R>(&self, name: impl Into<String>, body: impl FnOnce(&Group<'_>) -> R) -> R {
        let mut path = self.path.clone();
        path.push(name.into());
        body(&Group::new(self.suite, path))
    }
}

impl std::fmt::Debug for Group<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("path", &self.path).finish()
    }
}
