//! Case labels
//!
//! A label is either a single message or the ordered segments collected
//! from nested `describe` groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a registered case
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Single(String),
    Nested(Vec<String>),
}

impl Label {
    /// Label for a case registered at the top level
    pub fn single(message: impl Into<String>) -> Self {
        Label::Single(message.into())
    }

    /// Label built from group segments followed by the case's own message
    pub fn nested(groups: &[String], leaf: impl Into<String>) -> Self {
        let mut segments = groups.to_vec();
        segments.push(leaf.into());
        Label::Nested(segments)
    }

    /// All segments, outermost first
    pub fn segments(&self) -> &[String] {
        match self {
            Label::Single(message) => std::slice::from_ref(message),
            Label::Nested(segments) => segments,
        }
    }

    /// The case's own message (last segment)
    pub fn leaf(&self) -> &str {
        self.segments().last().map(String::as_str).unwrap_or("")
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Label::Nested(_))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join(" - "))
    }
}

impl From<&str> for Label {
    fn from(message: &str) -> Self {
        Label::single(message)
    }
}

impl From<String> for Label {
    fn from(message: String) -> Self {
        Label::Single(message)
    }
}

impl From<Vec<String>> for Label {
    fn from(segments: Vec<String>) -> Self {
        Label::Nested(segments)
    }
}

impl From<Vec<&str>> for Label {
    fn from(segments: Vec<&str>) -> Self {
        Label::Nested(segments.into_iter().map(String::from).collect())
    }
}
