//! Per-request processing context.
//!
//! The context rides alongside the [`Exchange`](jolt_core::Exchange)
//! through every pipeline step. It carries framework-level state that is
//! not part of the HTTP exchange itself: the request ID, the resolved
//! route, and a type-keyed extension map that filters use to hand values
//! to later stages.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

use jolt_core::{RequestId, RouteHandler};
use jolt_router::Params;

/// The route resolved for the current request.
#[derive(Clone)]
pub struct ResolvedRoute {
    /// The handler registered for the matched route.
    pub handler: RouteHandler,
    /// Path parameters extracted during matching.
    pub params: Params,
}

impl std::fmt::Debug for ResolvedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedRoute")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// State threaded through the pipeline for a single request.
pub struct ProcessingContext {
    request_id: RequestId,
    route: Option<ResolvedRoute>,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    started_at: Instant,
}

impl std::fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("request_id", &self.request_id)
            .field("route", &self.route.is_some())
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

impl ProcessingContext {
    /// Creates a context for a request.
    #[must_use]
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            extensions: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Records the resolved route. Set by the routing step.
    pub fn set_route(&mut self, route: ResolvedRoute) {
        self.route = Some(route);
    }

    /// Returns the resolved route, if routing has run.
    #[must_use]
    pub fn route(&self) -> Option<&ResolvedRoute> {
        self.route.as_ref()
    }

    /// Stores a typed extension value, replacing any previous value of
    /// the same type.
    pub fn insert_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Drops a typed extension value, if present.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) {
        self.extensions.remove(&TypeId::of::<T>());
    }

    /// Time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
