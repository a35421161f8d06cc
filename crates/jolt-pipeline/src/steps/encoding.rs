//! Character set setup.

use jolt_core::{BoxFuture, Exchange, JoltResult};

use crate::context::ProcessingContext;
use crate::step::{PipelineStep, StepFlow};

/// Applies the configured character set to the exchange before anything
/// writes a body.
#[derive(Debug, Clone)]
pub struct EncodingStep {
    charset: String,
}

impl EncodingStep {
    /// Creates the step with the given charset.
    #[must_use]
    pub fn new(charset: impl Into<String>) -> Self {
        Self {
            charset: charset.into(),
        }
    }
}

impl PipelineStep for EncodingStep {
    fn name(&self) -> &'static str {
        "encoding"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            ex.set_charset(self.charset.clone());
            tracing::debug!(
                request_id = %ctx.request_id(),
                method = %ex.method(),
                path = ex.path(),
                "request accepted"
            );
            Ok(StepFlow::Continue)
        })
    }
}
