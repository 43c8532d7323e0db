//! A compiled route: prefix, upstream and accepted methods.

use std::collections::HashSet;

use axum::http::Method;

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// Immutable mapping from a path prefix to an upstream base URL.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    matcher: PathPrefixMatcher,
    upstream_base: String,
    allowed_methods: HashSet<Method>,
}

impl Route {
    pub fn new<I>(name: impl Into<String>, path_prefix: &str, upstream_base: &str, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self {
            name: name.into(),
            matcher: PathPrefixMatcher::new(path_prefix),
            upstream_base: upstream_base.trim_end_matches('/').to_string(),
            allowed_methods: methods.into_iter().collect(),
        }
    }

    /// Compile a route from config. Methods are upper-cased; unparseable ones
    /// are dropped (validation rejects them before this point).
    pub fn from_config(config: &RouteConfig) -> Self {
        let methods = config.methods.iter().filter_map(|m| {
            match Method::from_bytes(m.to_ascii_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    tracing::warn!(route = %config.name, method = %m, "Ignoring invalid method");
                    None
                }
            }
        });
        Self::new(config.name.clone(), &config.path_prefix, &config.upstream_url, methods)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn matcher(&self) -> &PathPrefixMatcher {
        &self.matcher
    }

    /// Upstream base URL without a trailing slash.
    pub fn upstream_base(&self) -> &str {
        &self.upstream_base
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Allowed methods in a stable order, for logging.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<_> = self.allowed_methods.iter().map(Method::as_str).collect();
        methods.sort_unstable();
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_normalizes() {
        let config = RouteConfig::new(
            "configs",
            "/api/v1/configs/",
            "http://configuration-service:8080/",
            &["get", "POST", "NOT A METHOD"],
        );
        let route = Route::from_config(&config);

        assert_eq!(route.path_prefix(), "/api/v1/configs");
        assert_eq!(route.upstream_base(), "http://configuration-service:8080");
        assert!(route.allows(&Method::GET));
        assert!(route.allows(&Method::POST));
        assert!(!route.allows(&Method::DELETE));
        assert_eq!(route.methods(), vec!["GET", "POST"]);
    }
}
