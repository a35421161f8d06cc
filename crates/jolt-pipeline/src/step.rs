//! The pipeline step interface.

use jolt_core::{BoxFuture, Exchange, JoltResult};

use crate::context::ProcessingContext;

/// Whether processing continues to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepFlow {
    /// Proceed to the next step.
    Continue,
    /// The response is finalized; skip all remaining steps.
    Handled,
}

/// One stage of the request pipeline.
///
/// Steps run in a fixed order and may mutate both the context and the
/// exchange. A step either continues the chain, declares the request
/// handled, or propagates an error for the outer boundary to render.
pub trait PipelineStep: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the step.
    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>>;
}
