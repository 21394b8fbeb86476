//! Route matching logic.
//!
//! # Responsibilities
//! - Match a path prefix on segment boundaries
//! - Compute the path forwarded upstream once the prefix is removed
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/chatbot` matches `/chatbot` and `/chatbot/...`, never `/chatbotx`
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Remove the prefix from `path`, yielding the upstream path, or `None`
    /// when `path` is neither the prefix itself nor beneath it.
    ///
    /// A bare prefix hit maps to the upstream root `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
