//! Cross-site request forgery protection.
//!
//! Double-submit check: state-changing requests must carry a CSRF token
//! header that matches the token cookie. Safe methods (GET, HEAD,
//! OPTIONS, TRACE) and explicitly exempted paths are never checked.

use http::Method;

use jolt_auth::PathPattern;
use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::Filter;
use crate::step::StepFlow;

const DEFAULT_COOKIE: &str = "jolt-csrf";
const DEFAULT_HEADER: &str = "x-csrf-token";

/// CSRF double-submit filter.
///
/// # Example
///
/// ```
/// use jolt_pipeline::filters::CsrfFilter;
/// use jolt_auth::PathPattern;
///
/// let csrf = CsrfFilter::new()
///     .exempt(PathPattern::compile("/webhooks/**").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct CsrfFilter {
    cookie_name: String,
    header_name: String,
    exempt: Vec<PathPattern>,
}

impl Default for CsrfFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfFilter {
    /// Creates a filter with the default cookie and header names.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE.to_string(),
            header_name: DEFAULT_HEADER.to_string(),
            exempt: Vec::new(),
        }
    }

    /// Overrides the token cookie name.
    #[must_use]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Overrides the token header name.
    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Exempts paths matching a pattern from the check.
    #[must_use]
    pub fn exempt(mut self, pattern: PathPattern) -> Self {
        self.exempt.push(pattern);
        self
    }

    fn is_safe(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
        )
    }
}

impl Filter for CsrfFilter {
    fn name(&self) -> &'static str {
        "csrf"
    }

    fn apply<'a>(
        &'a self,
        _ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            if Self::is_safe(ex.method()) {
                return Ok(StepFlow::Continue);
            }
            if self.exempt.iter().any(|p| p.matches(ex.path())) {
                return Ok(StepFlow::Continue);
            }

            let cookie = ex.cookie(&self.cookie_name);
            let header = ex.header(&self.header_name);
            match (cookie.as_deref(), header) {
                (Some(c), Some(h)) if c == h => Ok(StepFlow::Continue),
                _ => {
                    tracing::debug!(path = ex.path(), "CSRF token missing or mismatched");
                    Err(JoltError::forbidden("CSRF token mismatch"))
                }
            }
        })
    }
}
