//! Core types for the event log. Domain-agnostic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event as stored in the log. Returned by all read methods.
///
/// `seq` is log-assigned and strictly increasing across the whole log, which
/// also makes it strictly increasing within any single tag's stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub seq: i64,
    pub ts: DateTime<Utc>,
    pub tag: String,
    pub payload: serde_json::Value,
}

/// An event to be appended. The caller builds this; the log assigns seq/ts.
#[derive(Debug, Clone)]
pub struct AppendEvent {
    pub tag: String,
    pub payload: serde_json::Value,
}

impl AppendEvent {
    /// Create an event from anything already serialized to JSON.
    pub fn new(tag: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }
}

/// Acknowledgement of a successful append.
#[derive(Debug, Clone, Copy)]
pub struct Ack {
    pub seq: i64,
    pub ts: DateTime<Utc>,
}

/// A predicate over tags. Subscriptions and reads are filtered by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    tags: Vec<String>,
}

impl TagFilter {
    /// Match a single tag.
    pub fn one(tag: impl Into<String>) -> Self {
        Self {
            tags: vec![tag.into()],
        }
    }

    /// Match any of the given tags.
    pub fn any<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_filter_matches_only_listed_tags() {
        let filter = TagFilter::any(["machine", "robot"]);
        assert!(filter.matches("machine"));
        assert!(filter.matches("robot"));
        assert!(!filter.matches("toss"));
    }
}
