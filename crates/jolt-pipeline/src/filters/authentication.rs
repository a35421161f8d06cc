//! Access-control enforcement filter.
//!
//! Thin HTTP adapter over the rule engine: the engine decides, this
//! filter translates the decision into the pipeline's vocabulary of
//! errors and committed responses.

use jolt_auth::{AccessDecision, AuthEngine, RouteRules};
use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::Filter;
use crate::step::StepFlow;

/// Evaluates the access rules for every routed request.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationFilter {
    engine: AuthEngine,
}

impl AuthenticationFilter {
    /// Creates a filter over a rule set.
    #[must_use]
    pub fn new(rules: RouteRules) -> Self {
        Self {
            engine: AuthEngine::new(rules),
        }
    }

    /// Returns the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &AuthEngine {
        &self.engine
    }
}

impl Filter for AuthenticationFilter {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn apply<'a>(
        &'a self,
        _ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            match self.engine.evaluate(ex) {
                AccessDecision::Allow => Ok(StepFlow::Continue),
                AccessDecision::Deny => Err(JoltError::forbidden("access denied")),
                AccessDecision::Challenge { header } => {
                    Err(JoltError::challenge("authentication required", header))
                }
                AccessDecision::InvalidCredentials { header } => {
                    Err(JoltError::challenge("invalid credentials", header))
                }
                AccessDecision::Redirect { location } => {
                    ex.redirect(&location)?;
                    Ok(StepFlow::Handled)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode};
    use jolt_core::RequestId;

    fn ctx() -> ProcessingContext {
        ProcessingContext::new(RequestId::new())
    }

    #[tokio::test]
    async fn test_allowed_request_continues() {
        let filter = AuthenticationFilter::new(
            RouteRules::builder().route("/open/**").permit().build().unwrap(),
        );
        let mut ex = Exchange::new(Method::GET, "/open/page", HeaderMap::new());
        assert_eq!(
            filter.apply(&mut ctx(), &mut ex).await.unwrap(),
            StepFlow::Continue
        );
    }

    #[tokio::test]
    async fn test_denied_request_is_forbidden() {
        let filter = AuthenticationFilter::new(
            RouteRules::builder().route("/closed/**").deny().build().unwrap(),
        );
        let mut ex = Exchange::new(Method::GET, "/closed/page", HeaderMap::new());
        assert!(matches!(
            filter.apply(&mut ctx(), &mut ex).await,
            Err(JoltError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_challenge_carries_www_authenticate() {
        let filter = AuthenticationFilter::new(
            RouteRules::builder()
                .route("/account/**")
                .authenticated()
                .build()
                .unwrap(),
        );
        let mut ex = Exchange::new(Method::GET, "/account/me", HeaderMap::new());
        match filter.apply(&mut ctx(), &mut ex).await {
            Err(JoltError::Unauthorized { challenge, .. }) => {
                assert_eq!(challenge.as_deref(), Some("Session realm=\"jolt\""));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_redirect_commits_the_response() {
        let filter = AuthenticationFilter::new(
            RouteRules::builder()
                .route("/account/**")
                .on_failure_redirect("/login")
                .authenticated()
                .build()
                .unwrap(),
        );
        let mut ex = Exchange::new(Method::GET, "/account/me", HeaderMap::new());
        let flow = filter.apply(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Handled);
        assert!(ex.committed());
        assert_eq!(ex.status(), StatusCode::FOUND);
        assert_eq!(ex.response_headers().get("location").unwrap(), "/login");
    }
}
