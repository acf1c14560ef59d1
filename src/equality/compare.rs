//! Depth-bounded structural comparison
//!
//! Sequences compare index by index, mappings key by key, everything
//! else by strict equality. The first divergence stops the walk.

use std::fmt;

use crate::models::Value;

/// Default recursion budget
pub const DEFAULT_MAX_DEPTH: usize = 7;

static UNDEFINED: Value = Value::Undefined;

/// One step of a divergence path
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// First point where two trees differ
#[derive(Clone, Debug)]
pub struct Divergence {
    pub path: Vec<PathSegment>,
    pub actual: Value,
    pub expected: Value,
}

impl Divergence {
    /// Dot-joined path, empty at the root
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Result of [`compare`]
#[derive(Clone, Debug)]
pub enum Comparison {
    Pass,
    Fail(Divergence),
    /// The recursion budget ran out before the walk finished
    DepthExceeded { max_depth: usize },
}

impl Comparison {
    pub fn is_pass(&self) -> bool {
        matches!(self, Comparison::Pass)
    }

    pub fn divergence(&self) -> Option<&Divergence> {
        match self {
            Comparison::Fail(divergence) => Some(divergence),
            _ => None,
        }
    }
}

enum Step {
    Equal,
    Diverged(Divergence),
    TooDeep,
}

/// Compare `actual` against `expected` with a recursion budget of `max_depth`
pub fn compare(actual: &Value, expected: &Value, max_depth: usize) -> Comparison {
    let mut path = Vec::new();
    match walk(actual, expected, max_depth, &mut path) {
        Step::Equal => Comparison::Pass,
        Step::Diverged(divergence) => Comparison::Fail(divergence),
        Step::TooDeep => Comparison::DepthExceeded { max_depth },
    }
}

fn walk(actual: &Value, expected: &Value, remaining: usize, path: &mut Vec<PathSegment>) -> Step {
    if remaining == 0 {
        return Step::TooDeep;
    }

    match (actual, expected) {
        (Value::Sequence(left), Value::Sequence(right)) => {
            let len = left.len().max(right.len());
            for index in 0..len {
                path.push(PathSegment::Index(index));
                let step = walk(
                    left.get(index).unwrap_or(&UNDEFINED),
                    right.get(index).unwrap_or(&UNDEFINED),
                    remaining - 1,
                    path,
                );
                if !matches!(step, Step::Equal) {
                    return step;
                }
                path.pop();
            }
            Step::Equal
        }
        (Value::Mapping(left), Value::Mapping(right)) => {
            // Keys of the larger side drive the walk; ties go to `expected`.
            let driver = if left.len() > right.len() { left } else { right };
            for key in driver.keys() {
                path.push(PathSegment::Key(key.clone()));
                let step = walk(
                    left.get(key).unwrap_or(&UNDEFINED),
                    right.get(key).unwrap_or(&UNDEFINED),
                    remaining - 1,
                    path,
                );
                if !matches!(step, Step::Equal) {
                    return step;
                }
                path.pop();
            }
            Step::Equal
        }
        _ if actual.strict_eq(expected) => Step::Equal,
        _ => Step::Diverged(Divergence {
            path: path.clone(),
            actual: actual.clone(),
            expected: expected.clone(),
        }),
    }
}
