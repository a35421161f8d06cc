//! Route authorization rule engine for the Jolt web framework.
//!
//! Access control is expressed as an ordered list of [`RouteRule`]s, each
//! scoping a path pattern (and optionally a method set) to one of three
//! postures: permit, deny, or authenticate via a pluggable
//! [`AuthStrategy`]. The [`AuthEngine`] evaluates a request against the
//! rules first-match-wins and returns an [`AccessDecision`]; requests no
//! rule covers are allowed through.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use http::{HeaderMap, Method};
//! use jolt_auth::{AccessDecision, AuthEngine, RouteRules};
//! use jolt_core::Exchange;
//!
//! let rules = RouteRules::builder()
//!     .route("/public/**").permit()
//!     .route("/admin/**").authenticated()
//!     .any_route().deny()
//!     .build()
//!     .unwrap();
//!
//! let engine = AuthEngine::new(rules);
//! let request = Exchange::new(Method::GET, "/public/css/app.css", HeaderMap::new());
//! assert_eq!(engine.evaluate(&request), AccessDecision::Allow);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod pattern;
mod rule;
mod rules;
mod strategy;

pub use engine::{AccessDecision, AuthEngine};
pub use pattern::{PathPattern, PatternError};
pub use rule::{Access, FailureHandler, RouteRule};
pub use rules::{RouteRules, RouteRulesBuilder, RuleBuilder};
pub use strategy::{
    values_match, AuthStrategy, BasicStrategy, ClaimsDecoder, JwtStrategy, SessionStrategy,
};
