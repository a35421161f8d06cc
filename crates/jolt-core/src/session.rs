//! Session store boundary.
//!
//! The pipeline treats session storage as an external collaborator. A
//! [`SessionState`] handle is attached to the exchange at pipeline entry
//! (typically resolved from a session cookie by the embedding server) and
//! exposes only what the authorization engine needs: an authenticated flag
//! and named attributes.

use serde_json::Value;

/// Read-side view of one client's session.
pub trait SessionState: Send + Sync {
    /// Returns true if this session has been marked authenticated.
    fn is_authenticated(&self) -> bool;

    /// Returns a named session attribute, if present.
    fn get(&self, key: &str) -> Option<Value>;
}
