//! # Jolt Core
//!
//! Core types and traits for the Jolt web framework: the standard error
//! type, the per-request [`Exchange`] wrapper, the [`Handler`] trait, and
//! the session/token collaborator boundaries the authorization engine
//! depends on.
//!
//! These types are deliberately free of pipeline mechanics; the request
//! pipeline itself lives in `jolt-pipeline` and the authorization rule
//! engine in `jolt-auth`.

#![doc(html_root_url = "https://docs.rs/jolt-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod exchange;
pub mod fixtures;
pub mod handler;
pub mod request_id;
pub mod session;
pub mod token;

// Re-export main types at crate root
pub use error::{JoltError, JoltResult};
pub use exchange::{Exchange, HttpResponse, ResponseBuffer};
pub use handler::{handler_fn, BoxFuture, FnHandler, Handler, Outcome, RouteHandler};
pub use request_id::RequestId;
pub use session::SessionState;
pub use token::TokenDecoder;
