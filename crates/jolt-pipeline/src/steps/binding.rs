//! Path parameter and session binding.

use std::sync::Arc;

use jolt_core::{BoxFuture, Exchange, JoltResult, SessionState};

use crate::context::ProcessingContext;
use crate::step::{PipelineStep, StepFlow};

/// Resolves the session handle for a request, typically from a session
/// cookie against an external store.
pub type SessionLoader = Arc<dyn Fn(&Exchange) -> Option<Arc<dyn SessionState>> + Send + Sync>;

/// Copies the matched route's parameters onto the exchange and attaches
/// the session, making both visible to filters and the handler.
#[derive(Clone, Default)]
pub struct ParamBindingStep {
    session_loader: Option<SessionLoader>,
}

impl ParamBindingStep {
    /// Creates the step, optionally with a session loader.
    #[must_use]
    pub fn new(session_loader: Option<SessionLoader>) -> Self {
        Self { session_loader }
    }
}

impl std::fmt::Debug for ParamBindingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamBindingStep")
            .field("session_loader", &self.session_loader.is_some())
            .finish()
    }
}

impl PipelineStep for ParamBindingStep {
    fn name(&self) -> &'static str {
        "param_binding"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            if let Some(route) = ctx.route() {
                ex.bind_params(route.params.clone());
            }
            if let Some(loader) = &self.session_loader {
                if ex.session().is_none() {
                    if let Some(session) = loader(ex) {
                        ex.attach_session(session);
                    }
                }
            }
            Ok(StepFlow::Continue)
        })
    }
}
