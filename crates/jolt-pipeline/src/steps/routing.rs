//! Route resolution.

use std::sync::Arc;

use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult, RouteHandler};
use jolt_router::Router;

use crate::context::{ProcessingContext, ResolvedRoute};
use crate::step::{PipelineStep, StepFlow};

/// Resolves the request against the route registry.
///
/// A path with no registration at all is a 404. A path that exists under
/// other methods is a 405 carrying the `Allow` list.
pub struct RoutingStep {
    router: Arc<Router<RouteHandler>>,
}

impl RoutingStep {
    /// Creates the step over a route registry.
    #[must_use]
    pub fn new(router: Arc<Router<RouteHandler>>) -> Self {
        Self { router }
    }
}

impl std::fmt::Debug for RoutingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingStep")
            .field("routes", &self.router.len())
            .finish()
    }
}

impl PipelineStep for RoutingStep {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            if let Some(matched) = self.router.match_route(ex.method(), ex.path()) {
                ctx.set_route(ResolvedRoute {
                    handler: Arc::clone(matched.value),
                    params: matched.params,
                });
                return Ok(StepFlow::Continue);
            }

            if let Some(allow) = self.router.allow_header(ex.path()) {
                tracing::debug!(path = ex.path(), %allow, "method not allowed");
                return Err(JoltError::method_not_allowed(ex.path(), allow));
            }

            tracing::debug!(path = ex.path(), "no route matched");
            Err(JoltError::not_found(ex.path()))
        })
    }
}
