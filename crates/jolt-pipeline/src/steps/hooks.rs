//! Before/after hook execution steps.

use jolt_auth::PathPattern;
use jolt_core::{BoxFuture, Exchange, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::ScriptNonce;
use crate::hook::BoxedHook;
use crate::step::{PipelineStep, StepFlow};

/// A hook and its optional path scope. `None` runs on every request.
pub type ScopedHook = (Option<PathPattern>, BoxedHook);

async fn run_hooks(hooks: &[ScopedHook], ex: &mut Exchange) -> JoltResult<()> {
    for (pattern, hook) in hooks {
        if pattern.as_ref().map_or(true, |p| p.matches(ex.path())) {
            hook.call(ex).await?;
        }
    }
    Ok(())
}

/// Runs the registered before-hooks whose scope matches the request path.
///
/// A hook that commits the response suppresses handler invocation; the
/// after-hooks and the commit step still run.
#[derive(Clone, Default)]
pub struct BeforeHooksStep {
    hooks: Vec<ScopedHook>,
}

impl BeforeHooksStep {
    /// Creates the step over the registered hooks.
    #[must_use]
    pub fn new(hooks: Vec<ScopedHook>) -> Self {
        Self { hooks }
    }
}

impl std::fmt::Debug for BeforeHooksStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeforeHooksStep")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl PipelineStep for BeforeHooksStep {
    fn name(&self) -> &'static str {
        "before_hooks"
    }

    fn run<'a>(
        &'a self,
        _ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            run_hooks(&self.hooks, ex).await?;
            Ok(StepFlow::Continue)
        })
    }
}

/// Runs the registered after-hooks whose scope matches the request
/// path, then drops the per-request script nonce.
///
/// After-hooks run whether or not the handler committed; response
/// headers may still be adjusted here.
#[derive(Clone, Default)]
pub struct AfterHooksStep {
    hooks: Vec<ScopedHook>,
}

impl AfterHooksStep {
    /// Creates the step over the registered hooks.
    #[must_use]
    pub fn new(hooks: Vec<ScopedHook>) -> Self {
        Self { hooks }
    }
}

impl std::fmt::Debug for AfterHooksStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfterHooksStep")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl PipelineStep for AfterHooksStep {
    fn name(&self) -> &'static str {
        "after_hooks"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            run_hooks(&self.hooks, ex).await?;
            ctx.remove_extension::<ScriptNonce>();
            Ok(StepFlow::Continue)
        })
    }
}
