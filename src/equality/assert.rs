//! Assertion wrapper over [`compare`]
//!
//! Turns a comparison into a case result whose error carries the
//! reporter-formatted diff.

use std::future::IntoFuture;
use std::sync::Arc;

use super::compare::{compare, Comparison, DEFAULT_MAX_DEPTH};
use crate::error::{CaseError, CaseResult};
use crate::models::Value;
use crate::reporter::Reporter;

/// Equality assertion bound to a reporter's formatter
#[derive(Clone)]
pub struct Assertion {
    reporter: Arc<dyn Reporter>,
}

impl Assertion {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Assert deep equality with the default depth budget
    pub fn check(&self, actual: impl Into<Value>, expected: impl Into<Value>) -> CaseResult {
        self.check_depth(actual, expected, DEFAULT_MAX_DEPTH)
    }

    /// Assert deep equality with an explicit depth budget
    pub fn check_depth(
        &self,
        actual: impl Into<Value>,
        expected: impl Into<Value>,
        max_depth: usize,
    ) -> CaseResult {
        let actual = actual.into();
        let expected = expected.into();

        match compare(&actual, &expected, max_depth) {
            Comparison::Pass => Ok(()),
            Comparison::Fail(divergence) => Err(CaseError::Assertion {
                path: divergence.path_string(),
                rendered: self.reporter.format_assert_err(&actual, &expected),
            }),
            Comparison::DepthExceeded { max_depth } => {
                let text = Value::from(format!("Maximum recursion depth exceeded: {max_depth}"));
                Err(CaseError::DepthExceeded {
                    max_depth,
                    rendered: self.reporter.format_assert_err(&text, &text),
                })
            }
        }
    }

    /// Await both sides concurrently, then assert deep equality
    pub async fn check_async<A, B>(&self, actual: A, expected: B) -> CaseResult
    where
        A: IntoFuture,
        A::Output: Into<Value>,
        B: IntoFuture,
        B::Output: Into<Value>,
    {
        let (actual, expected) = futures::join!(actual.into_future(), expected.into_future());
        self.check(actual, expected)
    }
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion").finish_non_exhaustive()
    }
}
