//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a request path
//! - Return matched route plus suffix path, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical route counts)
//! - Longest prefix wins; equal-length ties go to the first registered route
//! - Explicit NoMatch rather than silent default

use crate::config::RouteConfig;
use crate::routing::route::Route;

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    /// Path with the prefix removed, never empty.
    pub suffix: &'a str,
}

/// Static list of routes built once at startup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let routes = configs.iter().map(Route::from_config).collect();
        Self::new(routes)
    }

    /// Find the route for `path`.
    pub fn match_path<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        let mut best: Option<RouteMatch<'a>> = None;

        for route in &self.routes {
            let Some(suffix) = route.matcher().strip(path) else {
                continue;
            };
            // Strictly longer only, so the earlier registration keeps a tie.
            let longer = best
                .map(|b| route.matcher().len() > b.route.matcher().len())
                .unwrap_or(true);
            if longer {
                best = Some(RouteMatch { route, suffix });
            }
        }

        best
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn route(name: &str, prefix: &str) -> Route {
        Route::new(name, prefix, &format!("http://{}:8080", name), [Method::GET])
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = RouteTable::new(vec![
            route("api", "/api/v1"),
            route("deployments", "/api/v1/deployments"),
            route("configs", "/api/v1/configs"),
        ]);

        let m = table.match_path("/api/v1/configs/foo").unwrap();
        assert_eq!(m.route.name(), "configs");
        assert_eq!(m.suffix, "/foo");

        let m = table.match_path("/api/v1/users/7").unwrap();
        assert_eq!(m.route.name(), "api");
        assert_eq!(m.suffix, "/users/7");

        let m = table.match_path("/api/v1/deployments").unwrap();
        assert_eq!(m.route.name(), "deployments");
        assert_eq!(m.suffix, "/");
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let table = RouteTable::new(vec![route("first", "/api/v1"), route("second", "/api/v1/")]);
        let m = table.match_path("/api/v1/x").unwrap();
        assert_eq!(m.route.name(), "first");
    }

    #[test]
    fn test_order_independent_for_distinct_lengths() {
        let table = RouteTable::new(vec![
            route("configs", "/api/v1/configs"),
            route("api", "/api/v1"),
        ]);
        assert_eq!(table.match_path("/api/v1/configs/a").unwrap().route.name(), "configs");
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::new(vec![route("api", "/api/v1")]);
        assert!(table.match_path("/api/v2/x").is_none());
        assert!(table.match_path("/api").is_none());
        assert!(table.match_path("/api/v1beta").is_none());
    }
}
