//! The request pipeline.
//!
//! [`RoutePipeline`] owns the fixed step sequence and is the single
//! entry point a server embedding binds to. Steps either continue,
//! declare the request handled, or fail; failures hit the outer error
//! boundary, which renders every [`JoltError`] into the standard JSON
//! envelope with the status-specific headers (`Allow`,
//! `WWW-Authenticate`, `Retry-After`).

use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE, RETRY_AFTER, WWW_AUTHENTICATE};
use http::{HeaderMap, Method};
use http_body_util::Full;

use jolt_auth::{PathPattern, RouteRules};
use jolt_core::{
    Exchange, HttpResponse, JoltError, RequestId, RouteHandler, SessionState,
};
use jolt_router::Router;

use crate::context::ProcessingContext;
use crate::filters::{
    order, AuthenticationFilter, CorsFilter, CsrfFilter, Filter, FilterRegistry, NonceFilter,
    RateLimitFilter, SecureHeadersFilter,
};
use crate::hook::{hook_fn, Hook};
use crate::step::{PipelineStep, StepFlow};
use crate::steps::{
    AfterHooksStep, BeforeHooksStep, EncodingStep, FilterChainStep, InvocationStep,
    ParamBindingStep, ResponseCommitStep, RoutingStep, ScopedHook, SessionLoader,
    StaticAssetsStep,
};

/// The fixed-order request pipeline.
///
/// # Example
///
/// ```
/// use jolt_pipeline::RoutePipeline;
/// use jolt_core::{handler_fn, Outcome};
/// use http::{HeaderMap, Method, StatusCode};
///
/// # tokio_test::block_on(async {
/// let pipeline = RoutePipeline::builder()
///     .get("/hello/{name}", handler_fn(|ex| {
///         let name = ex.param("name").unwrap_or("world").to_string();
///         Ok(Outcome::Text(format!("hello {name}")))
///     }))
///     .build();
///
/// let response = pipeline
///     .process(Method::GET, "/hello/jolt", HeaderMap::new())
///     .await;
/// assert_eq!(response.status(), StatusCode::OK);
/// # });
/// ```
pub struct RoutePipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl RoutePipeline {
    /// Creates a pipeline builder.
    #[must_use]
    pub fn builder() -> RoutePipelineBuilder {
        RoutePipelineBuilder::new()
    }

    /// Processes one request through every step and returns the response.
    ///
    /// This never fails: errors from any step are rendered by the outer
    /// boundary into an error envelope response.
    pub async fn process(
        &self,
        method: Method,
        path: impl Into<String>,
        headers: HeaderMap,
    ) -> HttpResponse {
        let raw = path.into();
        // Matching and rules operate on the path only.
        let path = raw.split('?').next().unwrap_or("").to_string();

        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();

        let mut ctx = ProcessingContext::new(request_id);
        let mut ex = Exchange::new(method, path, headers);

        for step in &self.steps {
            match step.run(&mut ctx, &mut ex).await {
                Ok(StepFlow::Continue) => {}
                Ok(StepFlow::Handled) => {
                    tracing::debug!(step = step.name(), "pipeline short-circuited");
                    break;
                }
                Err(err) => return Self::render_error(&ctx, &err),
            }
        }

        if ex.response_headers().get("x-request-id").is_none() {
            if let Ok(value) = http::HeaderValue::from_str(&ctx.request_id().to_string()) {
                ex.set_header(http::header::HeaderName::from_static("x-request-id"), value);
            }
        }
        if !ex.committed() {
            ex.finish();
        }
        ex.into_response()
    }

    /// Returns the step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn render_error(ctx: &ProcessingContext, err: &JoltError) -> HttpResponse {
        let status = err.status_code();
        if status.is_server_error() {
            tracing::error!(request_id = %ctx.request_id(), error = %err, "request failed");
        } else {
            tracing::debug!(request_id = %ctx.request_id(), error = %err, "request rejected");
        }

        let body = err.envelope(&ctx.request_id().to_string());

        let mut builder = http::Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .header("x-request-id", ctx.request_id().to_string());

        match err {
            JoltError::MethodNotAllowed { allow, .. } => {
                builder = builder.header(ALLOW, allow);
            }
            JoltError::Unauthorized {
                challenge: Some(challenge),
                ..
            } => {
                builder = builder.header(WWW_AUTHENTICATE, challenge);
            }
            JoltError::RateLimited {
                retry_after_seconds,
            } => {
                builder = builder.header(RETRY_AFTER, retry_after_seconds.to_string());
            }
            _ => {}
        }

        builder
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("error response parts are valid")
    }
}

impl std::fmt::Debug for RoutePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutePipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Builder for [`RoutePipeline`].
///
/// Routes, access rules, filters, and hooks are all declared here; the
/// step order itself is fixed and not configurable.
pub struct RoutePipelineBuilder {
    charset: String,
    router: Router<RouteHandler>,
    assets: StaticAssetsStep,
    rules: Option<RouteRules>,
    controller_rules: Option<RouteRules>,
    session_loader: Option<SessionLoader>,
    cors: Option<CorsFilter>,
    csrf: Option<CsrfFilter>,
    secure_headers: Option<SecureHeadersFilter>,
    rate_limit: Option<RateLimitFilter>,
    user_filters: Vec<(u16, Arc<dyn Filter>, Vec<PathPattern>)>,
    before_hooks: Vec<ScopedHook>,
    after_hooks: Vec<ScopedHook>,
}

impl Default for RoutePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutePipelineBuilder {
    /// Creates a builder with no routes and no filters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            charset: "utf-8".to_string(),
            router: Router::new(),
            assets: StaticAssetsStep::new(),
            rules: None,
            controller_rules: None,
            session_loader: None,
            cors: None,
            csrf: None,
            secure_headers: None,
            rate_limit: None,
            user_filters: Vec::new(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    /// Sets the character set for text bodies.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Registers a route.
    #[must_use]
    pub fn route(mut self, method: Method, path: &str, handler: RouteHandler) -> Self {
        self.router.register(method, path, handler);
        self
    }

    /// Registers a `GET` route.
    #[must_use]
    pub fn get(self, path: &str, handler: RouteHandler) -> Self {
        self.route(Method::GET, path, handler)
    }

    /// Registers a `POST` route.
    #[must_use]
    pub fn post(self, path: &str, handler: RouteHandler) -> Self {
        self.route(Method::POST, path, handler)
    }

    /// Registers a `PUT` route.
    #[must_use]
    pub fn put(self, path: &str, handler: RouteHandler) -> Self {
        self.route(Method::PUT, path, handler)
    }

    /// Registers a `DELETE` route.
    #[must_use]
    pub fn delete(self, path: &str, handler: RouteHandler) -> Self {
        self.route(Method::DELETE, path, handler)
    }

    /// Registers an in-memory static asset at an exact path.
    #[must_use]
    pub fn asset(
        mut self,
        path: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        self.assets.insert(path, content_type, body);
        self
    }

    /// Sets the centrally configured access rules.
    ///
    /// These evaluate before any controller-provided rules.
    #[must_use]
    pub fn rules(mut self, rules: RouteRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Appends controller-provided access rules, evaluated after the
    /// central rules.
    #[must_use]
    pub fn controller_rules(mut self, rules: RouteRules) -> Self {
        self.controller_rules = Some(match self.controller_rules.take() {
            Some(existing) => existing.merge(rules),
            None => rules,
        });
        self
    }

    /// Sets the session loader invoked during param binding.
    #[must_use]
    pub fn session_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Exchange) -> Option<Arc<dyn SessionState>> + Send + Sync + 'static,
    {
        self.session_loader = Some(Arc::new(loader));
        self
    }

    /// Enables the CORS filter.
    #[must_use]
    pub fn cors(mut self, filter: CorsFilter) -> Self {
        self.cors = Some(filter);
        self
    }

    /// Enables the CSRF filter.
    #[must_use]
    pub fn csrf(mut self, filter: CsrfFilter) -> Self {
        self.csrf = Some(filter);
        self
    }

    /// Enables the secure-headers filter (and with it the per-request
    /// script nonce).
    #[must_use]
    pub fn secure_headers(mut self, filter: SecureHeadersFilter) -> Self {
        self.secure_headers = Some(filter);
        self
    }

    /// Enables the rate limiting filter.
    #[must_use]
    pub fn rate_limit(mut self, filter: RateLimitFilter) -> Self {
        self.rate_limit = Some(filter);
        self
    }

    /// Registers a user filter at the given offset above the internal
    /// filter band.
    #[must_use]
    pub fn filter<F: Filter + 'static>(mut self, offset: u16, filter: F) -> Self {
        self.user_filters.push((offset, Arc::new(filter), Vec::new()));
        self
    }

    /// Registers a user filter that is skipped on paths matching any of
    /// the exclusion patterns.
    #[must_use]
    pub fn filter_excluding<F: Filter + 'static>(
        mut self,
        offset: u16,
        filter: F,
        exclusions: Vec<PathPattern>,
    ) -> Self {
        self.user_filters.push((offset, Arc::new(filter), exclusions));
        self
    }

    /// Registers a before-hook that runs on every request.
    #[must_use]
    pub fn before<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.before_hooks.push((None, Arc::new(hook)));
        self
    }

    /// Registers a before-hook scoped to paths matching a pattern.
    #[must_use]
    pub fn before_on<H: Hook + 'static>(mut self, pattern: PathPattern, hook: H) -> Self {
        self.before_hooks.push((Some(pattern), Arc::new(hook)));
        self
    }

    /// Registers a synchronous before-hook closure.
    #[must_use]
    pub fn before_fn<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut Exchange) -> jolt_core::JoltResult<()> + Send + Sync + 'static,
    {
        self.before_hooks.push((None, hook_fn(func)));
        self
    }

    /// Registers an after-hook that runs on every request.
    #[must_use]
    pub fn after<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.after_hooks.push((None, Arc::new(hook)));
        self
    }

    /// Registers an after-hook scoped to paths matching a pattern.
    #[must_use]
    pub fn after_on<H: Hook + 'static>(mut self, pattern: PathPattern, hook: H) -> Self {
        self.after_hooks.push((Some(pattern), Arc::new(hook)));
        self
    }

    /// Registers a synchronous after-hook closure.
    #[must_use]
    pub fn after_fn<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut Exchange) -> jolt_core::JoltResult<()> + Send + Sync + 'static,
    {
        self.after_hooks.push((None, hook_fn(func)));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> RoutePipeline {
        let mut registry = FilterRegistry::new();

        if let Some(cors) = self.cors {
            registry.register_internal(order::CORS, Arc::new(cors));
        }
        if self.secure_headers.is_some() {
            registry.register_internal(order::NONCE, Arc::new(NonceFilter));
        }
        if let Some(csrf) = self.csrf {
            registry.register_internal(order::CSRF, Arc::new(csrf));
        }

        let rules = match (self.rules, self.controller_rules) {
            (Some(central), Some(derived)) => Some(central.merge(derived)),
            (Some(rules), None) | (None, Some(rules)) => Some(rules),
            (None, None) => None,
        };
        if let Some(rules) = rules {
            registry.register_internal(
                order::AUTHENTICATION,
                Arc::new(AuthenticationFilter::new(rules)),
            );
        }

        if let Some(secure) = self.secure_headers {
            registry.register_internal(order::SECURE_HEADERS, Arc::new(secure));
        }
        if let Some(limiter) = self.rate_limit {
            registry.register_internal(order::RATE_LIMIT, Arc::new(limiter));
        }
        for (offset, filter, exclusions) in self.user_filters {
            registry.register_excluding(offset, filter, exclusions);
        }

        let steps: Vec<Arc<dyn PipelineStep>> = vec![
            Arc::new(EncodingStep::new(self.charset)),
            Arc::new(self.assets),
            Arc::new(RoutingStep::new(Arc::new(self.router))),
            Arc::new(ParamBindingStep::new(self.session_loader)),
            Arc::new(FilterChainStep::new(Arc::new(registry))),
            Arc::new(BeforeHooksStep::new(self.before_hooks)),
            Arc::new(InvocationStep),
            Arc::new(AfterHooksStep::new(self.after_hooks)),
            Arc::new(ResponseCommitStep),
        ];

        RoutePipeline { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use jolt_core::{handler_fn, Outcome};

    #[test]
    fn test_step_order_is_fixed() {
        let pipeline = RoutePipeline::builder().build();
        assert_eq!(
            pipeline.step_names(),
            vec![
                "encoding",
                "static_assets",
                "routing",
                "param_binding",
                "filters",
                "before_hooks",
                "invocation",
                "after_hooks",
                "response_commit",
            ]
        );
    }

    #[tokio::test]
    async fn test_basic_dispatch() {
        let pipeline = RoutePipeline::builder()
            .get("/ping", handler_fn(|_| Ok(Outcome::Text("pong".to_string()))))
            .build();

        let response = pipeline.process(Method::GET, "/ping", HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_query_string_is_stripped_before_matching() {
        let pipeline = RoutePipeline::builder()
            .get("/search", handler_fn(|_| Ok(Outcome::Text("ok".to_string()))))
            .build();

        let response = pipeline
            .process(Method::GET, "/search?q=rust", HeaderMap::new())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_renders_404_envelope() {
        let pipeline = RoutePipeline::builder().build();
        let response = pipeline.process(Method::GET, "/nope", HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_method_mismatch_renders_405_with_allow() {
        let pipeline = RoutePipeline::builder()
            .get("/users", handler_fn(|_| Ok(Outcome::Text("ok".to_string()))))
            .build();
        let response = pipeline.process(Method::POST, "/users", HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get("allow").unwrap(), "GET");
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_propagated() {
        let pipeline = RoutePipeline::builder()
            .get("/ping", handler_fn(|_| Ok(Outcome::Text("pong".to_string()))))
            .build();

        let id = RequestId::new().to_string();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", id.parse().unwrap());
        let response = pipeline.process(Method::GET, "/ping", headers).await;
        assert_eq!(response.headers().get("x-request-id").unwrap(), id.as_str());
    }
}
