//! Authentication strategies.
//!
//! An [`AuthStrategy`] answers two questions for a matched rule: is the
//! current request authenticated, and how should the client be challenged
//! when it is not. Strategies that can also produce per-key credentials
//! (session attributes, JWT claims) opt into the rule engine's credential
//! gate via [`AuthStrategy::supports_credentials`].
//!
//! All strategy state is explicit per-instance configuration set at
//! construction; there is no process-wide mutable strategy state.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

use jolt_core::{Exchange, TokenDecoder};

/// Default realm used in challenge headers.
const DEFAULT_REALM: &str = "jolt";

/// A pluggable authentication strategy.
pub trait AuthStrategy: Send + Sync {
    /// The challenge scheme name (`Session`, `Bearer`, `Basic`, ...).
    fn scheme(&self) -> &'static str;

    /// The realm advertised in challenge headers.
    fn realm(&self) -> &str;

    /// Returns true if the request carries valid credentials.
    fn authenticate(&self, ex: &Exchange) -> bool;

    /// The `WWW-Authenticate` header value for a failed authentication.
    fn challenge_header(&self) -> String {
        format!("{} realm=\"{}\"", self.scheme(), self.realm())
    }

    /// Whether this strategy can look up credential values by key.
    ///
    /// The rule engine only applies a rule's required-credential gate when
    /// the active strategy supports lookup; other strategies (e.g. Basic)
    /// skip the gate entirely.
    fn supports_credentials(&self) -> bool {
        false
    }

    /// Returns the actual value for a credential key, if available.
    fn credential(&self, _ex: &Exchange, _key: &str) -> Option<Value> {
        None
    }
}

/// Type-tolerant credential equality.
///
/// Numbers, strings, and booleans are compared by normalized string
/// representation, so a claim `"42"` satisfies an expected `42`.
#[must_use]
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    normalize(actual) == normalize(expected)
}

fn normalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Session-backed authentication.
///
/// Authenticated iff the exchange carries a session whose store reports
/// it authenticated. Credentials resolve to named session attributes.
#[derive(Debug, Clone)]
pub struct SessionStrategy {
    realm: String,
}

impl SessionStrategy {
    /// Creates a session strategy with the default realm.
    #[must_use]
    pub fn new() -> Self {
        Self {
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Creates a session strategy with an explicit realm.
    #[must_use]
    pub fn with_realm(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
        }
    }
}

impl Default for SessionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStrategy for SessionStrategy {
    fn scheme(&self) -> &'static str {
        "Session"
    }

    fn realm(&self) -> &str {
        &self.realm
    }

    fn authenticate(&self, ex: &Exchange) -> bool {
        ex.session().is_some_and(|s| s.is_authenticated())
    }

    fn supports_credentials(&self) -> bool {
        true
    }

    fn credential(&self, ex: &Exchange, key: &str) -> Option<Value> {
        ex.session()?.get(key)
    }
}

/// Bearer-token authentication backed by a [`TokenDecoder`].
///
/// Authenticated iff the request carries a bearer token the decoder
/// accepts and every required claim matches (type-tolerant). Credentials
/// resolve to decoded claim values.
#[derive(Clone)]
pub struct JwtStrategy {
    decoder: Arc<dyn TokenDecoder>,
    required_claims: HashMap<String, Value>,
    realm: String,
}

impl JwtStrategy {
    /// Creates a JWT strategy around a token decoder.
    #[must_use]
    pub fn new(decoder: Arc<dyn TokenDecoder>) -> Self {
        Self {
            decoder,
            required_claims: HashMap::new(),
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Sets the realm advertised in challenges.
    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Requires a claim to be present with a matching value.
    #[must_use]
    pub fn require_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.required_claims.insert(key.into(), value);
        self
    }

    fn decoded_claims(&self, ex: &Exchange) -> Option<Map<String, Value>> {
        self.decoder.claims(ex.bearer_token()?)
    }
}

impl std::fmt::Debug for JwtStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtStrategy")
            .field("required_claims", &self.required_claims)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl AuthStrategy for JwtStrategy {
    fn scheme(&self) -> &'static str {
        "Bearer"
    }

    fn realm(&self) -> &str {
        &self.realm
    }

    fn authenticate(&self, ex: &Exchange) -> bool {
        let Some(claims) = self.decoded_claims(ex) else {
            return false;
        };
        self.required_claims.iter().all(|(key, expected)| {
            claims
                .get(key)
                .is_some_and(|actual| values_match(actual, expected))
        })
    }

    fn supports_credentials(&self) -> bool {
        true
    }

    fn credential(&self, ex: &Exchange, key: &str) -> Option<Value> {
        self.decoded_claims(ex)?.get(key).cloned()
    }
}

/// HTTP Basic authentication against a configured user map.
#[derive(Debug, Clone)]
pub struct BasicStrategy {
    users: HashMap<String, String>,
    realm: String,
}

impl Default for BasicStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicStrategy {
    /// Creates a Basic strategy with no users.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// Sets the realm advertised in challenges.
    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    /// Registers a username/password pair.
    #[must_use]
    pub fn user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    fn decode_credentials(ex: &Exchange) -> Option<(String, String)> {
        let encoded = ex.header("authorization")?.strip_prefix("Basic ")?;
        let decoded = STANDARD.decode(encoded).ok()?;
        let text = String::from_utf8(decoded).ok()?;
        let (user, pass) = text.split_once(':')?;
        Some((user.to_string(), pass.to_string()))
    }
}

impl AuthStrategy for BasicStrategy {
    fn scheme(&self) -> &'static str {
        "Basic"
    }

    fn realm(&self) -> &str {
        &self.realm
    }

    fn authenticate(&self, ex: &Exchange) -> bool {
        let Some((user, pass)) = Self::decode_credentials(ex) else {
            return false;
        };
        self.users.get(&user).is_some_and(|expected| *expected == pass)
    }
}

/// A [`TokenDecoder`] that decodes JWT claims without signature verification.
///
/// Splits the compact form, base64url-decodes the payload segment, and
/// parses it as a JSON object. Deployments that need verification supply
/// their own decoder; this one is suitable behind an ingress that has
/// already verified the token, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsDecoder;

impl TokenDecoder for ClaimsDecoder {
    fn claims(&self, token: &str) -> Option<Map<String, Value>> {
        let mut parts = token.split('.');
        let _header = parts.next()?;
        let payload = parts.next()?;
        let _signature = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&decoded).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method};
    use jolt_core::fixtures::{MemorySession, StaticDecoder};
    use jolt_router::Params;
    use serde_json::json;

    fn exchange_with_session(session: MemorySession) -> Exchange {
        Exchange::from_parts(
            Method::GET,
            "/",
            HeaderMap::new(),
            Params::new(),
            Some(Arc::new(session)),
        )
    }

    fn exchange_with_header(name: &'static str, value: String) -> Exchange {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(&value).unwrap());
        Exchange::new(Method::GET, "/", headers)
    }

    #[test]
    fn test_values_match_type_tolerant() {
        assert!(values_match(&json!("42"), &json!(42)));
        assert!(values_match(&json!(true), &json!("true")));
        assert!(values_match(&json!("admin"), &json!("admin")));
        assert!(!values_match(&json!("42"), &json!(43)));
        assert!(!values_match(&json!("admin"), &json!("user")));
    }

    #[test]
    fn test_session_strategy() {
        let strategy = SessionStrategy::new();
        assert!(strategy.authenticate(&exchange_with_session(MemorySession::authenticated())));
        assert!(!strategy.authenticate(&exchange_with_session(MemorySession::anonymous())));
        // No session at all
        assert!(!strategy.authenticate(&Exchange::new(Method::GET, "/", HeaderMap::new())));
    }

    #[test]
    fn test_session_strategy_credentials() {
        let strategy = SessionStrategy::new();
        let ex = exchange_with_session(
            MemorySession::authenticated().with_attribute("role", json!("admin")),
        );
        assert!(strategy.supports_credentials());
        assert_eq!(strategy.credential(&ex, "role"), Some(json!("admin")));
        assert_eq!(strategy.credential(&ex, "missing"), None);
    }

    #[test]
    fn test_session_challenge_header() {
        let strategy = SessionStrategy::with_realm("app");
        assert_eq!(strategy.challenge_header(), "Session realm=\"app\"");
    }

    #[test]
    fn test_jwt_strategy_accepts_valid_token() {
        let decoder =
            StaticDecoder::new().with_token("good", [("sub".to_string(), json!("alice"))]);
        let strategy = JwtStrategy::new(Arc::new(decoder));

        let ex = exchange_with_header("authorization", "Bearer good".to_string());
        assert!(strategy.authenticate(&ex));

        let ex = exchange_with_header("authorization", "Bearer bad".to_string());
        assert!(!strategy.authenticate(&ex));
    }

    #[test]
    fn test_jwt_strategy_required_claims() {
        let decoder = StaticDecoder::new().with_token(
            "tok",
            [
                ("sub".to_string(), json!("alice")),
                ("role".to_string(), json!("user")),
            ],
        );
        let strategy = JwtStrategy::new(Arc::new(decoder)).require_claim("role", json!("admin"));

        let ex = exchange_with_header("authorization", "Bearer tok".to_string());
        assert!(!strategy.authenticate(&ex));
    }

    #[test]
    fn test_jwt_strategy_missing_token() {
        let strategy = JwtStrategy::new(Arc::new(StaticDecoder::new()));
        assert!(!strategy.authenticate(&Exchange::new(Method::GET, "/", HeaderMap::new())));
    }

    #[test]
    fn test_jwt_credentials_from_claims() {
        let decoder =
            StaticDecoder::new().with_token("tok", [("org".to_string(), json!("acme"))]);
        let strategy = JwtStrategy::new(Arc::new(decoder));
        let ex = exchange_with_header("authorization", "Bearer tok".to_string());
        assert_eq!(strategy.credential(&ex, "org"), Some(json!("acme")));
    }

    #[test]
    fn test_basic_strategy() {
        let strategy = BasicStrategy::new().user("alice", "secret");

        let encoded = STANDARD.encode("alice:secret");
        let ex = exchange_with_header("authorization", format!("Basic {encoded}"));
        assert!(strategy.authenticate(&ex));

        let encoded = STANDARD.encode("alice:wrong");
        let ex = exchange_with_header("authorization", format!("Basic {encoded}"));
        assert!(!strategy.authenticate(&ex));

        let ex = Exchange::new(Method::GET, "/", HeaderMap::new());
        assert!(!strategy.authenticate(&ex));
        assert!(!strategy.supports_credentials());
    }

    #[test]
    fn test_basic_challenge_header() {
        let strategy = BasicStrategy::new().realm("admin-area");
        assert_eq!(strategy.challenge_header(), "Basic realm=\"admin-area\"");
    }

    #[test]
    fn test_claims_decoder_parses_payload() {
        // {"sub":"alice","role":"admin"}
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice","role":"admin"}"#);
        let token = format!("eyJhbGciOiJub25lIn0.{payload}.sig");

        let claims = ClaimsDecoder.claims(&token).unwrap();
        assert_eq!(claims.get("sub"), Some(&json!("alice")));
        assert_eq!(claims.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_claims_decoder_rejects_malformed() {
        assert!(ClaimsDecoder.claims("not-a-jwt").is_none());
        assert!(ClaimsDecoder.claims("a.b").is_none());
        assert!(ClaimsDecoder.claims("a.!!!.c").is_none());
        assert!(ClaimsDecoder.claims("a.b.c.d").is_none());
    }
}
