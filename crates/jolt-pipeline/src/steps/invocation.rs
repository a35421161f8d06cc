//! Handler invocation.

use std::sync::Arc;

use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult, Outcome};

use crate::context::ProcessingContext;
use crate::step::{PipelineStep, StepFlow};

/// Invokes the resolved route handler and coerces its [`Outcome`] into
/// the response buffer.
///
/// Skipped when an earlier hook already committed the response.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationStep;

impl PipelineStep for InvocationStep {
    fn name(&self) -> &'static str {
        "invocation"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            if ex.committed() {
                return Ok(StepFlow::Continue);
            }
            let handler = ctx
                .route()
                .map(|route| Arc::clone(&route.handler))
                .ok_or_else(|| JoltError::internal("no route resolved before invocation"))?;

            match handler.call(ex).await? {
                Outcome::Text(body) => ex.text(body)?,
                Outcome::Html(body) => ex.html(body)?,
                Outcome::Json(value) => ex.json(&value)?,
                Outcome::Status(status) => {
                    ex.set_status(status);
                    ex.finish();
                }
                Outcome::Done => {}
            }
            Ok(StepFlow::Continue)
        })
    }
}
