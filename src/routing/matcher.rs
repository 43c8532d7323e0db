//! Path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes match on segment boundaries: `/api/v1` matches `/api/v1` and
//!   `/api/v1/x`, never `/api/v1x`
//! - No regex to guarantee O(n) matching

/// Matches the request path against a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing `/` is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Length used for longest-prefix ordering.
    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Returns the suffix left after removing the prefix, or `None` when the
    /// path does not match. An empty suffix is normalized to `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return path.starts_with('/').then_some(path);
        }

        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/")
        } else if rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Returns true if the path matches this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }
}
