//! # Jolt Pipeline
//!
//! The fixed-order request processing pipeline for the Jolt web
//! framework. Requests flow through nine stages: encoding, static
//! assets, routing, param binding, the filter chain, before-hooks,
//! handler invocation, after-hooks, and the final response commit.
//!
//! Cross-cutting behavior lives in [`filters`]: CORS, per-request script
//! nonces, CSRF protection, rule-based authentication, secure response
//! headers, and rate limiting, followed by any user-registered filters.
//!
//! # Example
//!
//! ```
//! use jolt_pipeline::RoutePipeline;
//! use jolt_pipeline::filters::SecureHeadersFilter;
//! use jolt_auth::RouteRules;
//! use jolt_core::{handler_fn, Outcome};
//! use http::{HeaderMap, Method, StatusCode};
//!
//! # tokio_test::block_on(async {
//! let pipeline = RoutePipeline::builder()
//!     .get("/status", handler_fn(|_| Ok(Outcome::Text("up".to_string()))))
//!     .rules(
//!         RouteRules::builder()
//!             .route("/admin/**").authenticated()
//!             .build()
//!             .unwrap(),
//!     )
//!     .secure_headers(SecureHeadersFilter::new())
//!     .build();
//!
//! let response = pipeline.process(Method::GET, "/status", HeaderMap::new()).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/jolt-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod filters;
pub mod hook;
mod pipeline;
pub mod step;
pub mod steps;

pub use context::{ProcessingContext, ResolvedRoute};
pub use hook::{hook_fn, BoxedHook, Hook};
pub use pipeline::{RoutePipeline, RoutePipelineBuilder};
pub use step::{PipelineStep, StepFlow};
pub use steps::SessionLoader;
