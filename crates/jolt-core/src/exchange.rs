//! The per-request request/response wrapper.
//!
//! An [`Exchange`] bundles the read side of an inbound request (method,
//! path, headers, bound path parameters, session handle) with a buffered
//! response that handlers, hooks, and filters write into. A response is
//! buffered until one of the terminal write operations commits it; every
//! write site checks [`Exchange::committed`] first, so exactly one response
//! is ever produced for a request.
//!
//! Path parameters and the session handle are bound by the pipeline's
//! param-binding step once the matched route is known.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use http_body_util::Full;
use serde_json::Value;

use crate::error::{JoltError, JoltResult};
use crate::session::SessionState;
use jolt_router::Params;

/// The HTTP response type produced by an exchange.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// Buffered response state.
///
/// Status, headers, and body accumulate here until a terminal operation
/// marks the buffer committed.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    committed: bool,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            committed: false,
        }
    }
}

/// Request/response wrapper threaded through filters, hooks, and handlers.
///
/// # Example
///
/// ```
/// use jolt_core::Exchange;
/// use http::{HeaderMap, Method, StatusCode};
///
/// let mut ex = Exchange::new(Method::GET, "/users/42", HeaderMap::new());
/// ex.text("hello").unwrap();
/// assert!(ex.committed());
///
/// let response = ex.into_response();
/// assert_eq!(response.status(), StatusCode::OK);
/// ```
#[derive(Clone)]
pub struct Exchange {
    method: Method,
    path: String,
    headers: HeaderMap,
    params: Params,
    session: Option<Arc<dyn SessionState>>,
    charset: String,
    response: ResponseBuffer,
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("session", &self.session.is_some())
            .field("committed", &self.response.committed)
            .finish_non_exhaustive()
    }
}

impl Exchange {
    /// Creates an exchange with no bound path parameters.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self::from_parts(method, path, headers, Params::new(), None)
    }

    /// Creates an exchange from all of its request-side parts.
    #[must_use]
    pub fn from_parts(
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
        params: Params,
        session: Option<Arc<dyn SessionState>>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            params,
            session,
            charset: "utf-8".to_string(),
            response: ResponseBuffer::default(),
        }
    }

    // --- Read accessors ---

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the normalized request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the inbound request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a request header value as a string, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the bearer token from the `Authorization` header, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")?.strip_prefix("Bearer ")
    }

    /// Returns a cookie value by name from the `Cookie` header.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        let raw = self.header("cookie")?;
        raw.split(';').find_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k == name).then(|| v.to_string())
        })
    }

    /// Returns a bound path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns all bound path parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the session handle for this request, if one was attached.
    #[must_use]
    pub fn session(&self) -> Option<&Arc<dyn SessionState>> {
        self.session.as_ref()
    }

    /// Sets the character set used for text bodies. Default is `utf-8`.
    pub fn set_charset(&mut self, charset: impl Into<String>) {
        self.charset = charset.into();
    }

    /// Binds the path parameters extracted from the matched route.
    pub fn bind_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Attaches the session handle for this request.
    pub fn attach_session(&mut self, session: Arc<dyn SessionState>) {
        self.session = Some(session);
    }

    // --- Response buffer ---

    /// Returns true if a terminal write has committed the response.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.response.committed
    }

    /// Returns the buffered response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    /// Sets the buffered response status without committing.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.response.status = status;
        self
    }

    /// Sets a response header without committing.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.response.headers.insert(name, value);
        self
    }

    /// Returns the buffered response headers.
    #[must_use]
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response.headers
    }

    fn commit(&mut self, content_type: Option<String>, body: Bytes) -> JoltResult<()> {
        if self.response.committed {
            return Err(JoltError::internal("response already committed"));
        }
        if let Some(ct) = content_type {
            let value = HeaderValue::from_str(&ct)
                .map_err(|_| JoltError::internal("invalid content type"))?;
            self.response.headers.insert(CONTENT_TYPE, value);
        }
        self.response.body = body;
        self.response.committed = true;
        Ok(())
    }

    /// Commits a plain-text response body.
    pub fn text(&mut self, body: impl Into<String>) -> JoltResult<()> {
        let ct = format!("text/plain; charset={}", self.charset);
        self.commit(Some(ct), Bytes::from(body.into()))
    }

    /// Commits an HTML response body.
    pub fn html(&mut self, body: impl Into<String>) -> JoltResult<()> {
        let ct = format!("text/html; charset={}", self.charset);
        self.commit(Some(ct), Bytes::from(body.into()))
    }

    /// Commits a JSON response body.
    pub fn json(&mut self, value: &Value) -> JoltResult<()> {
        let body = serde_json::to_vec(value)
            .map_err(|e| JoltError::internal(format!("JSON serialization failed: {e}")))?;
        self.commit(Some("application/json".to_string()), Bytes::from(body))
    }

    /// Commits raw bytes with an explicit content type.
    pub fn bytes(&mut self, content_type: impl Into<String>, body: Bytes) -> JoltResult<()> {
        self.commit(Some(content_type.into()), body)
    }

    /// Commits a 302 redirect to the given location.
    pub fn redirect(&mut self, location: &str) -> JoltResult<()> {
        if self.response.committed {
            return Err(JoltError::internal("response already committed"));
        }
        self.response.status = StatusCode::FOUND;
        let value = HeaderValue::from_str(location)
            .map_err(|_| JoltError::internal("invalid redirect location"))?;
        self.response.headers.insert(LOCATION, value);
        self.response.body = Bytes::new();
        self.response.committed = true;
        Ok(())
    }

    /// Commits a terminal status with a plain-text message.
    pub fn abort(&mut self, status: StatusCode, message: impl Into<String>) -> JoltResult<()> {
        self.response.status = status;
        self.text(message)
    }

    /// Marks the response committed without writing a body.
    ///
    /// The response-commit pipeline step uses this to flush a buffered
    /// response that no earlier step finalized.
    pub fn finish(&mut self) {
        self.response.committed = true;
    }

    /// Consumes the exchange and builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        let mut builder = http::Response::builder().status(self.response.status);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.response.headers;
        }
        builder
            .body(Full::new(self.response.body))
            .expect("response parts are always valid")
    }
}
