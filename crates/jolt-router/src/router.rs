//! High-level route registry API.

use http::Method;

use crate::method_table::MethodTable;
use crate::node::Node;
use crate::params::Params;
use crate::RouteMatch;

/// A radix tree route registry, generic over the routed value.
///
/// The pipeline stores type-erased handlers in the registry; tests often
/// use plain strings. Matching is O(k) in the path length.
///
/// # Example
///
/// ```rust
/// use jolt_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.register(Method::GET, "/users/{id}", "getUser");
///
/// let m = router.match_route(&Method::GET, "/users/42").unwrap();
/// assert_eq!(m.value, &"getUser");
/// assert_eq!(m.params.get("id"), Some("42"));
/// ```
///
/// # Route priority
///
/// Static segments match before `{param}` segments, which match before a
/// trailing `*name` catch-all.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers a value for a method and path pattern.
    pub fn register(&mut self, method: Method, path: &str, value: T) {
        self.root.insert(path, MethodTable::new().with(method, value));
        self.route_count += 1;
    }

    /// Inserts a full method table for a path.
    pub fn insert(&mut self, path: &str, table: MethodTable<T>) {
        self.root.insert(path, table);
        self.route_count += 1;
    }

    /// Matches a method and path, returning the routed value and parameters.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (table, params) = self.root.match_path(path)?;
        let value = table.get(method)?;
        Some(RouteMatch { value, params })
    }

    /// Matches a path regardless of method.
    ///
    /// Used for 405 detection: a path that matches here but not in
    /// [`Router::match_route`] exists under a different method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodTable<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns true if the path is registered under any method other than
    /// the given one.
    #[must_use]
    pub fn path_exists_with_other_method(&self, method: &Method, path: &str) -> bool {
        match self.root.match_path(path) {
            Some((table, _)) => table.get(method).is_none() && table.has_any_method(),
            None => false,
        }
    }

    /// Returns the comma-joined `Allow` header value for a path, if it exists.
    #[must_use]
    pub fn allow_header(&self, path: &str) -> Option<String> {
        self.root.match_path(path).map(|(table, _)| table.allow_header())
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
