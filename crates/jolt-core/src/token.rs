//! Token decoding boundary.
//!
//! JWT verification is delegated to an external collaborator behind the
//! [`TokenDecoder`] trait: given a compact token, produce its claim map or
//! `None` when the token is invalid. The framework never inspects token
//! internals itself; the JWT strategy only consumes the decoded claims.

use serde_json::{Map, Value};

/// Decodes and validates bearer tokens into claim maps.
pub trait TokenDecoder: Send + Sync {
    /// Returns the token's claims, or `None` if the token is invalid.
    fn claims(&self, token: &str) -> Option<Map<String, Value>>;
}
