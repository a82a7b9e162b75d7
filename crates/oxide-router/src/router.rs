//! Route table and request resolution.

use std::collections::HashMap;

use crate::error::{Result, RouterError};
use crate::path::{decode_path, normalize_path, PathPattern};
use crate::request::{Method, PathParams};

/// A single route definition.
#[derive(Debug, Clone)]
pub struct Route<H> {
    /// Unique route name.
    name: String,
    /// Accepted methods; empty accepts any method.
    methods: Vec<Method>,
    /// Path pattern.
    pattern: PathPattern,
    /// Handler descriptor.
    handler: H,
}

impl<H> Route<H> {
    /// Returns the route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Returns the handler descriptor.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns whether this route accepts `method`.
    pub fn allows(&self, method: Method) -> bool {
        self.methods.is_empty() || self.methods.contains(&method)
    }
}

/// A resolved route with the parameters extracted from the path.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The matched route.
    pub route: &'a Route<H>,
    /// Placeholder values, in pattern order.
    pub params: PathParams,
}

/// Collects route registrations; [`RouteTableBuilder::build`] validates them.
pub struct RouteTableBuilder<H> {
    entries: Vec<(String, Vec<Method>, String, H)>,
}

impl<H> Default for RouteTableBuilder<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> RouteTableBuilder<H> {
    /// Registers a route accepting any method.
    #[must_use]
    pub fn route(self, name: impl Into<String>, pattern: impl Into<String>, handler: H) -> Self {
        self.route_methods(name, &[], pattern, handler)
    }

    /// Registers a route restricted to `methods`.
    #[must_use]
    pub fn route_methods(
        mut self,
        name: impl Into<String>,
        methods: &[Method],
        pattern: impl Into<String>,
        handler: H,
    ) -> Self {
        self.entries
            .push((name.into(), methods.to_vec(), pattern.into(), handler));
        self
    }

    /// Builds the route table.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed pattern or duplicated route name.
    pub fn build(self) -> Result<RouteTable<H>> {
        let mut routes = Vec::with_capacity(self.entries.len());
        let mut by_name = HashMap::new();

        for (name, methods, pattern, handler) in self.entries {
            if by_name.contains_key(&name) {
                return Err(RouterError::DuplicateRoute(name));
            }
            let pattern = PathPattern::parse(&pattern)?;
            by_name.insert(name.clone(), routes.len());
            routes.push(Route {
                name,
                methods,
                pattern,
                handler,
            });
        }

        Ok(RouteTable { routes, by_name })
    }
}

/// An ordered, immutable set of routes.
///
/// Lookups take `&self` only, so a table can be shared across threads
/// without locking.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    /// Registered routes, in registration order.
    routes: Vec<Route<H>>,
    /// Route index by name for reverse URL lookup.
    by_name: HashMap<String, usize>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<H> RouteTable<H> {
    /// Starts a new table.
    pub fn builder() -> RouteTableBuilder<H> {
        RouteTableBuilder::default()
    }

    /// Returns the routes in registration order.
    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Looks up a route by name.
    pub fn get(&self, name: &str) -> Option<&Route<H>> {
        self.by_name.get(name).map(|&i| &self.routes[i])
    }

    /// Finds the first route matching `method` and `path`.
    ///
    /// The path is percent-decoded and then normalized, so encoded
    /// separators and dot segments cannot escape canonicalization. Routes are tried in registration order
    /// and the first one whose pattern, placeholder types and method set all
    /// match wins.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::NotFound`] when no route matches.
    pub fn resolve(&self, method: Method, path: &str) -> Result<RouteMatch<'_, H>> {
        let path = normalize_path(&decode_path(path));

        for route in &self.routes {
            if !route.allows(method) {
                continue;
            }
            if let Some(params) = route.pattern.match_path(&path) {
                return Ok(RouteMatch { route, params });
            }
        }

        Err(RouterError::NotFound {
            method: method.to_string(),
            path,
        })
    }

    /// Generates a URL for a named route.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::RouteNotFound`] for an unknown name or when the
    /// parameters do not satisfy the pattern.
    pub fn url_for(&self, name: &str, params: &HashMap<String, String>) -> Result<String> {
        self.get(name)
            .and_then(|route| route.pattern.reverse(params))
            .ok_or_else(|| RouterError::RouteNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        RouteTable::builder()
            .route("root", "/", "root")
            .route("user", "/user/:id(int)", "user")
            .route("user_by_name", "/user/:name(string)", "user_by_name")
            .route("date", "/:year(int)/:month(int)/:day(int)/user/:name", "date")
            .route_methods("create", &[Method::Post], "/posts", "create")
            .build()
            .unwrap()
    }

    #[test]
    fn test_root() {
        let table = table();
        let m = table.resolve(Method::Get, "/").unwrap();
        assert_eq!(*m.route.handler(), "root");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_typed_placeholders_disambiguate() {
        let table = table();
        let m = table.resolve(Method::Get, "/user/7").unwrap();
        assert_eq!(m.route.name(), "user");
        assert_eq!(m.params.get("id"), Some("7"));

        let m = table.resolve(Method::Get, "/user/naoina").unwrap();
        assert_eq!(m.route.name(), "user_by_name");
        assert_eq!(m.params.get("name"), Some("naoina"));
    }

    #[test]
    fn test_encoded_path_is_decoded_before_matching() {
        let table = table();
        let m = table.resolve(Method::Get, "/user/%37").unwrap();
        assert_eq!(m.route.name(), "user");
        assert_eq!(m.params.get("id"), Some("7"));
    }

    #[test]
    fn test_encoded_traversal_stays_inside_wildcard() {
        let table = RouteTable::builder()
            .route("static", "/static/*path", ())
            .build()
            .unwrap();

        let m = table
            .resolve(Method::Get, "/static/%2Ftmp%2Fsecret.txt")
            .unwrap();
        assert_eq!(m.params.get("path"), Some("tmp/secret.txt"));

        let m = table
            .resolve(Method::Get, "/static/css/%2e%2e/%2e%2e/%2e%2e/etc/passwd")
            .unwrap_err();
        assert!(matches!(m, RouterError::NotFound { .. }));

        let m = table
            .resolve(Method::Get, "/static/a%2F%2e%2e%2Fb.css")
            .unwrap();
        assert_eq!(m.params.get("path"), Some("b.css"));
    }

    #[test]
    fn test_first_registered_wins() {
        let table = RouteTable::builder()
            .route("by_name", "/user/:name(string)", 1)
            .route("by_id", "/user/:id(int)", 2)
            .build()
            .unwrap();
        let m = table.resolve(Method::Get, "/user/7").unwrap();
        assert_eq!(m.route.name(), "by_name");
    }

    #[test]
    fn test_multi_placeholder() {
        let table = table();
        let m = table.resolve(Method::Get, "/2013/07/19/user/naoina").unwrap();
        assert_eq!(m.route.name(), "date");
        assert_eq!(m.params.parse::<u32>("month"), Some(7));
        assert_eq!(m.params.get("name"), Some("naoina"));
    }

    #[test]
    fn test_path_is_normalized() {
        let table = table();
        let m = table.resolve(Method::Get, "//user/./../user/7").unwrap();
        assert_eq!(m.route.name(), "user");
    }

    #[test]
    fn test_not_found() {
        let table = table();
        let err = table.resolve(Method::Get, "/missing").unwrap_err();
        assert!(matches!(err, RouterError::NotFound { .. }));
        assert!(table.resolve(Method::Get, "/missing").is_err());
    }

    #[test]
    fn test_method_restriction() {
        let table = table();
        assert!(table.resolve(Method::Post, "/posts").is_ok());
        assert!(table.resolve(Method::Get, "/posts").is_err());
    }

    #[test]
    fn test_empty_table() {
        let table: RouteTable<()> = RouteTable::builder().build().unwrap();
        assert!(table.is_empty());
        assert!(table.resolve(Method::Get, "/").is_err());
    }

    #[test]
    fn test_duplicate_name() {
        let err = RouteTable::builder()
            .route("root", "/", ())
            .route("root", "/index", ())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::DuplicateRoute(name) if name == "root"));
    }

    #[test]
    fn test_malformed_pattern_fails_build() {
        let err = RouteTable::builder()
            .route("bad", "/user/:id(uuid)", ())
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidPattern { .. }));
    }

    #[test]
    fn test_url_for() {
        let table = table();
        let params: HashMap<String, String> =
            [("id".to_string(), "42".to_string())].into_iter().collect();
        assert_eq!(table.url_for("user", &params).unwrap(), "/user/42");
        assert!(table.url_for("nope", &params).is_err());
    }
}
