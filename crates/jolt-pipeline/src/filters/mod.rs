//! Request filters and the filter registry.
//!
//! Filters are ordered units of cross-cutting behavior that run as one
//! pipeline step, after routing and before handler invocation. The
//! framework's own filters occupy the order band below
//! [`FilterRegistry::USER_ORDER_BASE`]; user filters are registered with
//! an offset added on top of that base, so no user filter can run ahead
//! of the internal chain.

use std::sync::Arc;

use jolt_auth::PathPattern;
use jolt_core::{BoxFuture, Exchange, JoltResult};

use crate::context::ProcessingContext;
use crate::step::StepFlow;

mod authentication;
mod cors;
mod csrf;
mod nonce;
mod rate_limit;
mod secure_headers;

pub use authentication::AuthenticationFilter;
pub use cors::{CorsBuilder, CorsFilter};
pub use csrf::CsrfFilter;
pub use nonce::{NonceFilter, ScriptNonce};
pub use rate_limit::{rate_limit_headers, RateLimitBuilder, RateLimitFilter};
pub use secure_headers::SecureHeadersFilter;

/// Internal filter order slots.
pub(crate) mod order {
    pub const CORS: u16 = 10;
    pub const NONCE: u16 = 20;
    pub const CSRF: u16 = 30;
    pub const AUTHENTICATION: u16 = 40;
    pub const SECURE_HEADERS: u16 = 50;
    pub const RATE_LIMIT: u16 = 60;
}

/// A cross-cutting request filter.
pub trait Filter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Applies the filter.
    fn apply<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>>;
}

struct FilterEntry {
    order: u16,
    filter: Arc<dyn Filter>,
    exclusions: Vec<PathPattern>,
}

impl FilterEntry {
    fn applies_to(&self, path: &str) -> bool {
        !self.exclusions.iter().any(|p| p.matches(path))
    }
}

/// Ordered collection of filters.
#[derive(Default)]
pub struct FilterRegistry {
    entries: Vec<FilterEntry>,
}

impl FilterRegistry {
    /// Orders below this value are reserved for the framework's filters.
    pub const USER_ORDER_BASE: u16 = 100;

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an internal filter at a reserved order slot.
    pub(crate) fn register_internal(&mut self, order: u16, filter: Arc<dyn Filter>) {
        debug_assert!(order < Self::USER_ORDER_BASE);
        self.entries.push(FilterEntry {
            order,
            filter,
            exclusions: Vec::new(),
        });
    }

    /// Registers a user filter.
    ///
    /// The effective order is `USER_ORDER_BASE + offset`; ties keep
    /// registration order.
    pub fn register(&mut self, offset: u16, filter: Arc<dyn Filter>) {
        self.register_excluding(offset, filter, Vec::new());
    }

    /// Registers a user filter that is skipped on paths matching any of
    /// the exclusion patterns.
    pub fn register_excluding(
        &mut self,
        offset: u16,
        filter: Arc<dyn Filter>,
        exclusions: Vec<PathPattern>,
    ) {
        self.entries.push(FilterEntry {
            order: Self::USER_ORDER_BASE.saturating_add(offset),
            filter,
            exclusions,
        });
    }

    /// Returns the filters sorted by order.
    #[must_use]
    pub fn ordered(&self) -> Vec<Arc<dyn Filter>> {
        let mut entries: Vec<&FilterEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.order);
        entries.iter().map(|e| Arc::clone(&e.filter)).collect()
    }

    /// Returns the filters that apply to a request path, sorted by order.
    #[must_use]
    pub fn applicable(&self, path: &str) -> Vec<Arc<dyn Filter>> {
        let mut entries: Vec<&FilterEntry> = self
            .entries
            .iter()
            .filter(|e| e.applies_to(path))
            .collect();
        entries.sort_by_key(|e| e.order);
        entries.iter().map(|e| Arc::clone(&e.filter)).collect()
    }

    /// Returns the filter names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.ordered().iter().map(|f| f.name()).collect()
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no filters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Filter for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn apply<'a>(
            &'a self,
            _ctx: &'a mut ProcessingContext,
            _ex: &'a mut Exchange,
        ) -> BoxFuture<'a, JoltResult<StepFlow>> {
            Box::pin(async { Ok(StepFlow::Continue) })
        }
    }

    #[test]
    fn test_internal_filters_run_before_user_filters() {
        let mut registry = FilterRegistry::new();
        registry.register(0, Arc::new(Named("user-first")));
        registry.register_internal(order::SECURE_HEADERS, Arc::new(Named("secure-headers")));
        registry.register_internal(order::CORS, Arc::new(Named("cors")));
        registry.register(5, Arc::new(Named("user-second")));

        assert_eq!(
            registry.names(),
            vec!["cors", "secure-headers", "user-first", "user-second"]
        );
    }

    #[test]
    fn test_user_offset_cannot_underflow_reserved_band() {
        let mut registry = FilterRegistry::new();
        registry.register(0, Arc::new(Named("user")));
        registry.register_internal(order::RATE_LIMIT, Arc::new(Named("rate-limit")));
        assert_eq!(registry.names(), vec!["rate-limit", "user"]);
    }

    #[test]
    fn test_equal_orders_keep_registration_order() {
        let mut registry = FilterRegistry::new();
        registry.register(3, Arc::new(Named("a")));
        registry.register(3, Arc::new(Named("b")));
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_excluded_paths_skip_the_filter() {
        let mut registry = FilterRegistry::new();
        registry.register(0, Arc::new(Named("always")));
        registry.register_excluding(
            1,
            Arc::new(Named("guarded")),
            vec![PathPattern::compile("/health/**").unwrap()],
        );

        let names = |path: &str| -> Vec<&'static str> {
            registry.applicable(path).iter().map(|f| f.name()).collect()
        };
        assert_eq!(names("/api/users"), vec!["always", "guarded"]);
        assert_eq!(names("/health/live"), vec!["always"]);
    }
}
