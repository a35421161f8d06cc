//! Radix tree route registry for the Jolt web framework.
//!
//! This crate maps HTTP method + path to a routed value (the pipeline
//! stores type-erased handlers) using a radix tree keyed by path segment.
//! It also answers the two questions the routing pipeline step needs for
//! error responses: does this path exist under another method (405), and
//! which methods are valid for it (the `Allow` header).
//!
//! # Example
//!
//! ```rust
//! use jolt_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.register(Method::GET, "/users", "listUsers");
//! router.register(Method::GET, "/users/{id}", "getUser");
//! router.register(Method::GET, "/files/*path", "serveFile");
//!
//! let m = router.match_route(&Method::GET, "/users/123").unwrap();
//! assert_eq!(m.value, &"getUser");
//! assert_eq!(m.params.get("id"), Some("123"));
//! ```

mod method_table;
mod node;
mod params;
mod router;

pub use method_table::MethodTable;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route: the routed value plus extracted path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the matched route.
    pub value: &'a T,
    /// Extracted path parameters.
    pub params: Params,
}
