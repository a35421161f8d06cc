//! Test fixtures for session and token collaborators.
//!
//! These are in-memory stand-ins for the external session store and token
//! verifier, used across the workspace's test suites.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::session::SessionState;
use crate::token::TokenDecoder;

/// An in-memory session with a fixed authenticated flag and attribute map.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    authenticated: bool,
    attributes: HashMap<String, Value>,
}

impl MemorySession {
    /// Creates an unauthenticated session with no attributes.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates an authenticated session with no attributes.
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
            attributes: HashMap::new(),
        }
    }

    /// Adds a session attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

impl SessionState for MemorySession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.attributes.get(key).cloned()
    }
}

/// A token decoder returning pre-registered claim maps keyed by token.
#[derive(Debug, Clone, Default)]
pub struct StaticDecoder {
    tokens: HashMap<String, Map<String, Value>>,
}

impl StaticDecoder {
    /// Creates an empty decoder; every token is invalid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token and the claims it decodes to.
    #[must_use]
    pub fn with_token(
        mut self,
        token: impl Into<String>,
        claims: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        self.tokens.insert(token.into(), claims.into_iter().collect());
        self
    }
}

impl TokenDecoder for StaticDecoder {
    fn claims(&self, token: &str) -> Option<Map<String, Value>> {
        self.tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_session() {
        let session = MemorySession::authenticated().with_attribute("role", json!("admin"));
        assert!(session.is_authenticated());
        assert_eq!(session.get("role"), Some(json!("admin")));
        assert_eq!(session.get("missing"), None);
        assert!(!MemorySession::anonymous().is_authenticated());
    }

    #[test]
    fn test_static_decoder() {
        let decoder =
            StaticDecoder::new().with_token("tok", [("sub".to_string(), json!("alice"))]);
        let claims = decoder.claims("tok").unwrap();
        assert_eq!(claims.get("sub"), Some(&json!("alice")));
        assert!(decoder.claims("other").is_none());
    }
}
