//! Security response headers.

use http::header::{
    HeaderValue, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
    X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};

use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::{Filter, ScriptNonce};
use crate::step::StepFlow;

/// Stamps hardening headers onto every response.
///
/// Always sets `X-Content-Type-Options`, `X-Frame-Options`, and
/// `Referrer-Policy`. HSTS and a Content-Security-Policy are opt-in; a
/// CSP template may contain `{nonce}`, replaced with the per-request
/// script nonce when the nonce filter has run.
#[derive(Debug, Clone)]
pub struct SecureHeadersFilter {
    frame_options: HeaderValue,
    referrer_policy: HeaderValue,
    hsts_max_age: Option<u64>,
    csp_template: Option<String>,
}

impl Default for SecureHeadersFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureHeadersFilter {
    /// Creates a filter with the default header set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_options: HeaderValue::from_static("DENY"),
            referrer_policy: HeaderValue::from_static("strict-origin-when-cross-origin"),
            hsts_max_age: None,
            csp_template: None,
        }
    }

    /// Allows same-origin framing instead of denying all framing.
    #[must_use]
    pub fn frame_same_origin(mut self) -> Self {
        self.frame_options = HeaderValue::from_static("SAMEORIGIN");
        self
    }

    /// Enables `Strict-Transport-Security` with the given max-age.
    #[must_use]
    pub fn hsts_max_age(mut self, seconds: u64) -> Self {
        self.hsts_max_age = Some(seconds);
        self
    }

    /// Sets the Content-Security-Policy template. `{nonce}` expands to
    /// the per-request script nonce.
    #[must_use]
    pub fn content_security_policy(mut self, template: impl Into<String>) -> Self {
        self.csp_template = Some(template.into());
        self
    }
}

impl Filter for SecureHeadersFilter {
    fn name(&self) -> &'static str {
        "secure-headers"
    }

    fn apply<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            ex.set_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            ex.set_header(X_FRAME_OPTIONS, self.frame_options.clone());
            ex.set_header(REFERRER_POLICY, self.referrer_policy.clone());

            if let Some(max_age) = self.hsts_max_age {
                let value = HeaderValue::from_str(&format!("max-age={max_age}"))
                    .map_err(|_| JoltError::internal("invalid HSTS value"))?;
                ex.set_header(STRICT_TRANSPORT_SECURITY, value);
            }

            if let Some(template) = &self.csp_template {
                let policy = match ctx.get_extension::<ScriptNonce>() {
                    Some(nonce) => template.replace("{nonce}", nonce.value()),
                    None => template.clone(),
                };
                let value = HeaderValue::from_str(&policy)
                    .map_err(|_| JoltError::internal("invalid CSP value"))?;
                ex.set_header(CONTENT_SECURITY_POLICY, value);
            }

            Ok(StepFlow::Continue)
        })
    }
}
