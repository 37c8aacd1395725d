//! Path prefix matching.
//!
//! # Design Decisions
//! - Prefixes match on whole path segments: `/media_service` matches
//!   `/media_service` and `/media_service/x`, never `/media_service2`
//! - Matching is case-sensitive
//! - No regex to guarantee O(n) matching

/// Matches a request path against a service prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// A trailing slash on the configured prefix is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_end_matches('/').to_string();
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// Remainder of `path` after the prefix, always starting with `/`.
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
