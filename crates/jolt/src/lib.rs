//! # Jolt
//!
//! **Lightweight MVC web framework with a fixed request pipeline and
//! rule-based access control**
//!
//! Jolt routes requests through nine fixed stages: encoding, static
//! assets, routing, param binding, the filter chain, before-hooks,
//! handler invocation, after-hooks, and response commit. Access is
//! enforced by an ordered, first-match-wins rule engine supporting
//! session, JWT bearer, and HTTP Basic strategies.
//!
//! ## Quick Start
//!
//! ```rust
//! use jolt::prelude::*;
//! use http::{HeaderMap, Method, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let pipeline = RoutePipeline::builder()
//!     .get("/users/{id}", handler_fn(|ex| {
//!         let id = ex.param("id").unwrap_or_default().to_string();
//!         Ok(Outcome::Json(serde_json::json!({ "id": id })))
//!     }))
//!     .rules(
//!         RouteRules::builder()
//!             .route("/admin/**").authenticated()
//!             .build()?,
//!     )
//!     .build();
//!
//! let response = pipeline
//!     .process(Method::GET, "/users/7", HeaderMap::new())
//!     .await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # Ok::<(), jolt::auth::PatternError>(())
//! # }).unwrap();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Encoding → Assets → Routing → Binding → Filters → Before
//!                                                                 ↓
//! Response ← Commit ← After ←──────────────────────────── Handler ┘
//! ```

#![doc(html_root_url = "https://docs.rs/jolt/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use jolt_core as core;

// Re-export router types
pub use jolt_router as router;

// Re-export the access rule engine
pub use jolt_auth as auth;

// Re-export the request pipeline
pub use jolt_pipeline as pipeline;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use jolt::prelude::*;
/// ```
pub mod prelude {
    pub use jolt_core::{
        handler_fn, Exchange, Handler, JoltError, JoltResult, Outcome, RequestId, SessionState,
        TokenDecoder,
    };

    pub use jolt_router::{Params, RouteMatch, Router};

    pub use jolt_auth::{
        AccessDecision, AuthEngine, AuthStrategy, BasicStrategy, JwtStrategy, PathPattern,
        RouteRules, SessionStrategy,
    };

    pub use jolt_pipeline::filters::{
        CorsFilter, CsrfFilter, Filter, RateLimitFilter, SecureHeadersFilter,
    };
    pub use jolt_pipeline::{hook_fn, Hook, RoutePipeline, StepFlow};
}
