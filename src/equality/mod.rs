//! Equality engine
//!
//! Structural comparison of two [`Value`](crate::models::Value) trees and
//! the assertion helper built on top of it.

mod assert;
mod compare;

pub use assert::Assertion;
pub use compare::{compare, Comparison, Divergence, PathSegment, DEFAULT_MAX_DEPTH};
