//! Rule evaluation.

use jolt_core::Exchange;

use crate::rule::Access;
use crate::rules::RouteRules;
use crate::strategy::values_match;

/// The outcome of evaluating the rule set against a request.
///
/// The engine is HTTP-agnostic: it reports what should happen and the
/// pipeline's authentication filter translates that into status codes
/// and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Let the request proceed.
    Allow,
    /// Reject the request outright (403).
    Deny,
    /// Authentication is required and missing or invalid (401).
    Challenge {
        /// The `WWW-Authenticate` header value to send.
        header: String,
    },
    /// Authentication succeeded but a required credential did not match
    /// or was absent (401).
    InvalidCredentials {
        /// The `WWW-Authenticate` header value to send.
        header: String,
    },
    /// Send the client elsewhere instead of challenging.
    Redirect {
        /// The redirect target.
        location: String,
    },
}

/// Evaluates an ordered rule set against incoming requests.
///
/// The first matching rule decides; a request matching no rule is
/// allowed. Within an authenticated rule the strategy check runs first,
/// then the credential gate for strategies that support lookup.
#[derive(Debug, Clone, Default)]
pub struct AuthEngine {
    rules: RouteRules,
}

impl AuthEngine {
    /// Creates an engine over a rule set.
    #[must_use]
    pub fn new(rules: RouteRules) -> Self {
        Self { rules }
    }

    /// Returns the underlying rule set.
    #[must_use]
    pub fn rules(&self) -> &RouteRules {
        &self.rules
    }

    /// Evaluates the request and returns an access decision.
    #[must_use]
    pub fn evaluate(&self, ex: &Exchange) -> AccessDecision {
        let Some(rule) = self.rules.first_match(ex.path(), ex.method()) else {
            tracing::debug!(path = ex.path(), "no access rule matched, allowing");
            return AccessDecision::Allow;
        };

        tracing::debug!(
            path = ex.path(),
            pattern = rule.pattern_str(),
            access = ?rule.access(),
            "access rule matched"
        );

        match rule.access() {
            Access::Permit => AccessDecision::Allow,
            Access::Deny => AccessDecision::Deny,
            Access::Authenticated(None) => {
                tracing::warn!(
                    pattern = rule.pattern_str(),
                    "rule requires authentication but has no strategy, denying"
                );
                AccessDecision::Deny
            }
            Access::Authenticated(Some(strategy)) => {
                if !strategy.authenticate(ex) {
                    if let Some(handler) = &rule.on_failure {
                        if let Some(callback) = &handler.callback {
                            return callback(ex);
                        }
                        if let Some(location) = &handler.redirect {
                            return AccessDecision::Redirect {
                                location: location.clone(),
                            };
                        }
                    }
                    return AccessDecision::Challenge {
                        header: strategy.challenge_header(),
                    };
                }

                if strategy.supports_credentials() {
                    for (key, expected) in &rule.required_credentials {
                        let matched = strategy
                            .credential(ex, key)
                            .is_some_and(|actual| values_match(&actual, expected));
                        if !matched {
                            tracing::debug!(credential = %key, "required credential mismatch");
                            return AccessDecision::InvalidCredentials {
                                header: strategy.challenge_header(),
                            };
                        }
                    }
                }

                AccessDecision::Allow
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{BasicStrategy, JwtStrategy, SessionStrategy};
    use http::{HeaderMap, HeaderValue, Method};
    use jolt_core::fixtures::{MemorySession, StaticDecoder};
    use jolt_router::Params;
    use serde_json::json;
    use std::sync::Arc;

    fn engine(rules: RouteRules) -> AuthEngine {
        AuthEngine::new(rules)
    }

    fn anonymous(path: &str) -> Exchange {
        Exchange::new(Method::GET, path, HeaderMap::new())
    }

    fn with_session(path: &str, session: MemorySession) -> Exchange {
        Exchange::from_parts(
            Method::GET,
            path,
            HeaderMap::new(),
            Params::new(),
            Some(Arc::new(session)),
        )
    }

    fn with_bearer(path: &str, token: &str) -> Exchange {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        Exchange::new(Method::GET, path, headers)
    }

    #[test]
    fn test_unmatched_request_is_allowed() {
        let e = engine(
            RouteRules::builder()
                .route("/admin/**").deny()
                .build()
                .unwrap(),
        );
        assert_eq!(e.evaluate(&anonymous("/public/page")), AccessDecision::Allow);
    }

    #[test]
    fn test_permit_and_deny() {
        let e = engine(
            RouteRules::builder()
                .route("/open/**").permit()
                .route("/closed/**").deny()
                .build()
                .unwrap(),
        );
        assert_eq!(e.evaluate(&anonymous("/open/a")), AccessDecision::Allow);
        assert_eq!(e.evaluate(&anonymous("/closed/a")), AccessDecision::Deny);
    }

    #[test]
    fn test_session_challenge_when_unauthenticated() {
        let e = engine(
            RouteRules::builder()
                .route("/account/**").authenticated()
                .build()
                .unwrap(),
        );
        assert_eq!(
            e.evaluate(&anonymous("/account/settings")),
            AccessDecision::Challenge {
                header: "Session realm=\"jolt\"".to_string()
            }
        );
        assert_eq!(
            e.evaluate(&with_session("/account/settings", MemorySession::authenticated())),
            AccessDecision::Allow
        );
    }

    #[test]
    fn test_jwt_challenge_uses_bearer_scheme() {
        let decoder = StaticDecoder::new().with_token("tok", [("sub".to_string(), json!("a"))]);
        let jwt = Arc::new(JwtStrategy::new(Arc::new(decoder)).realm("api"));
        let e = engine(
            RouteRules::builder()
                .route("/api/**").strategy(jwt).authenticated()
                .build()
                .unwrap(),
        );
        assert_eq!(
            e.evaluate(&anonymous("/api/users")),
            AccessDecision::Challenge {
                header: "Bearer realm=\"api\"".to_string()
            }
        );
        assert_eq!(e.evaluate(&with_bearer("/api/users", "tok")), AccessDecision::Allow);
    }

    #[test]
    fn test_missing_strategy_denies() {
        let e = engine(
            RouteRules::builder()
                .clear_default_strategy()
                .route("/admin/**").authenticated()
                .build()
                .unwrap(),
        );
        assert_eq!(
            e.evaluate(&with_session("/admin/x", MemorySession::authenticated())),
            AccessDecision::Deny
        );
    }

    #[test]
    fn test_credential_gate() {
        let e = engine(
            RouteRules::builder()
                .route("/admin/**").require("role", json!("admin")).authenticated()
                .build()
                .unwrap(),
        );

        let ok = with_session(
            "/admin/x",
            MemorySession::authenticated().with_attribute("role", json!("admin")),
        );
        assert_eq!(e.evaluate(&ok), AccessDecision::Allow);

        let wrong_role = with_session(
            "/admin/x",
            MemorySession::authenticated().with_attribute("role", json!("user")),
        );
        assert_eq!(
            e.evaluate(&wrong_role),
            AccessDecision::InvalidCredentials {
                header: "Session realm=\"jolt\"".to_string()
            }
        );

        let missing = with_session("/admin/x", MemorySession::authenticated());
        assert!(matches!(
            e.evaluate(&missing),
            AccessDecision::InvalidCredentials { .. }
        ));
    }

    #[test]
    fn test_credential_gate_is_type_tolerant() {
        let e = engine(
            RouteRules::builder()
                .route("/admin/**").require("level", json!(5)).authenticated()
                .build()
                .unwrap(),
        );
        let ex = with_session(
            "/admin/x",
            MemorySession::authenticated().with_attribute("level", json!("5")),
        );
        assert_eq!(e.evaluate(&ex), AccessDecision::Allow);
    }

    #[test]
    fn test_credential_gate_skipped_without_lookup_support() {
        // Basic auth cannot resolve credential keys, so the gate does not
        // apply even when requirements are present.
        let basic = Arc::new(BasicStrategy::new().user("alice", "pw"));
        let e = engine(
            RouteRules::builder()
                .route("/ops/**")
                .strategy(basic)
                .require("role", json!("admin"))
                .authenticated()
                .build()
                .unwrap(),
        );

        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode("alice:pw");
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        let ex = Exchange::new(Method::GET, "/ops/restart", headers);
        assert_eq!(e.evaluate(&ex), AccessDecision::Allow);
    }

    #[test]
    fn test_failure_redirect() {
        let e = engine(
            RouteRules::builder()
                .route("/account/**")
                .on_failure_redirect("/login")
                .authenticated()
                .build()
                .unwrap(),
        );
        assert_eq!(
            e.evaluate(&anonymous("/account/x")),
            AccessDecision::Redirect {
                location: "/login".to_string()
            }
        );
    }

    #[test]
    fn test_failure_callback_overrides_redirect() {
        let e = engine(
            RouteRules::builder()
                .route("/account/**")
                .on_failure_redirect("/login")
                .on_failure_with(|_| AccessDecision::Deny)
                .authenticated()
                .build()
                .unwrap(),
        );
        assert_eq!(e.evaluate(&anonymous("/account/x")), AccessDecision::Deny);
    }

    #[test]
    fn test_explicit_strategy_overrides_default() {
        let jwt = Arc::new(JwtStrategy::new(Arc::new(StaticDecoder::new())));
        let e = engine(
            RouteRules::builder()
                .default_strategy(Arc::new(SessionStrategy::new()))
                .route("/api/**").strategy(jwt).authenticated()
                .build()
                .unwrap(),
        );
        // Session-authenticated but no bearer token: JWT strategy rejects.
        assert!(matches!(
            e.evaluate(&with_session("/api/x", MemorySession::authenticated())),
            AccessDecision::Challenge { .. }
        ));
    }
}
