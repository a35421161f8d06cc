//! Individual access rules.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use jolt_core::Exchange;

use crate::pattern::PathPattern;
use crate::strategy::AuthStrategy;
use crate::AccessDecision;

/// The access posture a rule assigns to the paths it matches.
#[derive(Clone)]
pub enum Access {
    /// Allow without authentication.
    Permit,
    /// Reject unconditionally.
    Deny,
    /// Require authentication via the given strategy.
    ///
    /// `None` marks a misconfigured rule: authentication was required but
    /// no strategy was resolved. The engine rejects such rules outright.
    Authenticated(Option<Arc<dyn AuthStrategy>>),
}

impl std::fmt::Debug for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permit => f.write_str("Permit"),
            Self::Deny => f.write_str("Deny"),
            Self::Authenticated(Some(s)) => write!(f, "Authenticated({})", s.scheme()),
            Self::Authenticated(None) => f.write_str("Authenticated(<unset>)"),
        }
    }
}

/// What to do when a rule's authentication check fails.
///
/// By default the engine issues a challenge in the strategy's scheme.
/// A rule can override that with a redirect target or an arbitrary
/// callback deciding the outcome from the exchange.
#[derive(Clone, Default)]
pub struct FailureHandler {
    pub(crate) redirect: Option<String>,
    pub(crate) callback: Option<Arc<dyn Fn(&Exchange) -> AccessDecision + Send + Sync>>,
}

impl std::fmt::Debug for FailureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureHandler")
            .field("redirect", &self.redirect)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// A single ordered access rule: a path scope, an optional method set,
/// an access posture, and optional credential requirements.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub(crate) pattern: Option<PathPattern>,
    pub(crate) any_path: bool,
    pub(crate) methods: Option<HashSet<Method>>,
    pub(crate) access: Access,
    pub(crate) required_credentials: HashMap<String, Value>,
    pub(crate) on_failure: Option<FailureHandler>,
}

impl RouteRule {
    /// Returns true if this rule applies to the given path and method.
    ///
    /// An empty or absent method set means the rule covers all methods.
    #[must_use]
    pub fn matches(&self, path: &str, method: &Method) -> bool {
        let path_ok = self.any_path
            || self
                .pattern
                .as_ref()
                .is_some_and(|p| p.matches(path));
        if !path_ok {
            return false;
        }
        match &self.methods {
            Some(set) if !set.is_empty() => set.contains(method),
            _ => true,
        }
    }

    /// Returns the rule's path pattern string, for diagnostics.
    #[must_use]
    pub fn pattern_str(&self) -> &str {
        if self.any_path {
            return "**";
        }
        self.pattern.as_ref().map_or("", PathPattern::as_str)
    }

    /// Returns the rule's access posture.
    #[must_use]
    pub fn access(&self) -> &Access {
        &self.access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, methods: Option<Vec<Method>>) -> RouteRule {
        RouteRule {
            pattern: Some(PathPattern::compile(pattern).unwrap()),
            any_path: false,
            methods: methods.map(|m| m.into_iter().collect()),
            access: Access::Permit,
            required_credentials: HashMap::new(),
            on_failure: None,
        }
    }

    #[test]
    fn test_path_and_method_scoping() {
        let r = rule("/api/**", Some(vec![Method::GET, Method::POST]));
        assert!(r.matches("/api/users", &Method::GET));
        assert!(r.matches("/api/users", &Method::POST));
        assert!(!r.matches("/api/users", &Method::DELETE));
        assert!(!r.matches("/other", &Method::GET));
    }

    #[test]
    fn test_empty_method_set_covers_all_methods() {
        let r = rule("/api/**", Some(vec![]));
        assert!(r.matches("/api/users", &Method::PATCH));

        let r = rule("/api/**", None);
        assert!(r.matches("/api/users", &Method::DELETE));
    }

    #[test]
    fn test_any_path_rule() {
        let r = RouteRule {
            pattern: None,
            any_path: true,
            methods: None,
            access: Access::Deny,
            required_credentials: HashMap::new(),
            on_failure: None,
        };
        assert!(r.matches("/anything/at/all", &Method::GET));
        assert_eq!(r.pattern_str(), "**");
    }
}
