//! Cross-origin resource sharing filter.
//!
//! Handles preflight `OPTIONS` requests directly and decorates other
//! cross-origin responses with the negotiated CORS headers. Requests
//! without an `Origin` header pass through untouched, as do requests
//! from origins outside the allow list (the browser enforces the
//! missing headers).

use http::header::{self, HeaderValue};
use http::{Method, StatusCode};

use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::Filter;
use crate::step::StepFlow;

/// CORS policy filter.
///
/// # Example
///
/// ```
/// use jolt_pipeline::filters::CorsFilter;
/// use http::Method;
///
/// let cors = CorsFilter::builder()
///     .allow_origin("https://app.example.com")
///     .allow_methods([Method::GET, Method::POST])
///     .allow_headers(["content-type", "x-csrf-token"])
///     .max_age_secs(600)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CorsFilter {
    allowed_origins: Vec<String>,
    any_origin: bool,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age_secs: u64,
}

impl CorsFilter {
    /// Creates a CORS builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::default()
    }

    /// A permissive policy: any origin, common methods, no credentials.
    #[must_use]
    pub fn permissive() -> Self {
        CorsBuilder::default().allow_any_origin().build()
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        self.any_origin || self.allowed_origins.iter().any(|o| o == origin)
    }

    fn methods_value(&self) -> String {
        self.allowed_methods
            .iter()
            .map(http::Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn apply_common_headers(&self, ex: &mut Exchange, origin: &str) -> JoltResult<()> {
        let origin_value = if self.any_origin && !self.allow_credentials {
            HeaderValue::from_static("*")
        } else {
            HeaderValue::from_str(origin)
                .map_err(|_| JoltError::bad_request("malformed Origin header"))?
        };
        ex.set_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin_value);
        ex.set_header(header::VARY, HeaderValue::from_static("origin"));
        if self.allow_credentials {
            ex.set_header(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        Ok(())
    }
}

impl Filter for CorsFilter {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn apply<'a>(
        &'a self,
        _ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            let Some(origin) = ex.header("origin").map(String::from) else {
                return Ok(StepFlow::Continue);
            };
            if !self.origin_allowed(&origin) {
                tracing::debug!(%origin, "origin outside CORS allow list");
                return Ok(StepFlow::Continue);
            }

            let preflight = ex.method() == Method::OPTIONS
                && ex.header("access-control-request-method").is_some();

            self.apply_common_headers(ex, &origin)?;

            if !preflight {
                return Ok(StepFlow::Continue);
            }

            let methods = HeaderValue::from_str(&self.methods_value())
                .map_err(|_| JoltError::internal("invalid CORS method list"))?;
            ex.set_header(header::ACCESS_CONTROL_ALLOW_METHODS, methods);
            if !self.allowed_headers.is_empty() {
                let headers = HeaderValue::from_str(&self.allowed_headers.join(", "))
                    .map_err(|_| JoltError::internal("invalid CORS header list"))?;
                ex.set_header(header::ACCESS_CONTROL_ALLOW_HEADERS, headers);
            }
            ex.set_header(
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from(self.max_age_secs),
            );
            ex.set_status(StatusCode::NO_CONTENT);
            ex.finish();
            Ok(StepFlow::Handled)
        })
    }
}

/// Builder for [`CorsFilter`].
#[derive(Debug, Clone)]
pub struct CorsBuilder {
    allowed_origins: Vec<String>,
    any_origin: bool,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age_secs: u64,
}

impl Default for CorsBuilder {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            any_origin: false,
            allowed_methods: vec![Method::GET, Method::POST, Method::PUT, Method::DELETE],
            allowed_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }
}

impl CorsBuilder {
    /// Adds an allowed origin.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origins.push(origin.into());
        self
    }

    /// Allows any origin.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.any_origin = true;
        self
    }

    /// Sets the allowed methods advertised to preflights.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Sets the allowed request headers advertised to preflights.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Allows credentialed requests. The exact origin is echoed back
    /// instead of `*` when set.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Sets how long preflight results may be cached.
    #[must_use]
    pub fn max_age_secs(mut self, seconds: u64) -> Self {
        self.max_age_secs = seconds;
        self
    }

    /// Builds the filter.
    #[must_use]
    pub fn build(self) -> CorsFilter {
        CorsFilter {
            allowed_origins: self.allowed_origins,
            any_origin: self.any_origin,
            allowed_methods: self.allowed_methods,
            allowed_headers: self.allowed_headers,
            allow_credentials: self.allow_credentials,
            max_age_secs: self.max_age_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use jolt_core::RequestId;

    fn ctx() -> ProcessingContext {
        ProcessingContext::new(RequestId::new())
    }

    fn request(method: Method, headers: &[(&'static str, &str)]) -> Exchange {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        Exchange::new(method, "/api/data", map)
    }

    #[tokio::test]
    async fn test_same_origin_request_passes_through() {
        let cors = CorsFilter::permissive();
        let mut ex = request(Method::GET, &[]);
        let flow = cors.apply(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Continue);
        assert!(ex.response_headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_preflight_is_answered_directly() {
        let cors = CorsFilter::builder()
            .allow_origin("https://app.example.com")
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(["content-type"])
            .build();

        let mut ex = request(
            Method::OPTIONS,
            &[
                ("origin", "https://app.example.com"),
                ("access-control-request-method", "POST"),
            ],
        );
        let flow = cors.apply(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Handled);
        assert!(ex.committed());
        assert_eq!(ex.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            ex.response_headers().get("access-control-allow-origin").unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            ex.response_headers().get("access-control-allow-methods").unwrap(),
            "GET, POST"
        );
    }

    #[tokio::test]
    async fn test_disallowed_origin_gets_no_headers() {
        let cors = CorsFilter::builder().allow_origin("https://ok.example").build();
        let mut ex = request(Method::GET, &[("origin", "https://evil.example")]);
        let flow = cors.apply(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Continue);
        assert!(ex.response_headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_any_origin_without_credentials_uses_wildcard() {
        let cors = CorsFilter::permissive();
        let mut ex = request(Method::GET, &[("origin", "https://a.example")]);
        cors.apply(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(
            ex.response_headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_credentials_echo_exact_origin() {
        let cors = CorsFilter::builder()
            .allow_any_origin()
            .allow_credentials(true)
            .build();
        let mut ex = request(Method::GET, &[("origin", "https://a.example")]);
        cors.apply(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(
            ex.response_headers().get("access-control-allow-origin").unwrap(),
            "https://a.example"
        );
        assert_eq!(
            ex.response_headers().get("access-control-allow-credentials").unwrap(),
            "true"
        );
    }
}
