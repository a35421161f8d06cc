//! Final response commit.

use http::header::HeaderName;
use http::HeaderValue;

use jolt_core::{BoxFuture, Exchange, JoltResult};

use crate::context::ProcessingContext;
use crate::step::{PipelineStep, StepFlow};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Stamps the request ID onto the response and flushes anything an
/// earlier step buffered without committing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseCommitStep;

impl PipelineStep for ResponseCommitStep {
    fn name(&self) -> &'static str {
        "response_commit"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
                ex.set_header(REQUEST_ID_HEADER, value);
            }
            if !ex.committed() {
                ex.finish();
            }
            tracing::debug!(
                request_id = %ctx.request_id(),
                status = %ex.status(),
                elapsed_ms = ctx.elapsed().as_millis() as u64,
                "response committed"
            );
            Ok(StepFlow::Continue)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method, StatusCode};
    use jolt_core::RequestId;

    #[tokio::test]
    async fn test_flushes_uncommitted_response() {
        let mut ctx = ProcessingContext::new(RequestId::new());
        let mut ex = Exchange::new(Method::GET, "/", HeaderMap::new());
        ex.set_status(StatusCode::NO_CONTENT);

        ResponseCommitStep.run(&mut ctx, &mut ex).await.unwrap();
        assert!(ex.committed());
        assert_eq!(ex.status(), StatusCode::NO_CONTENT);
        assert!(ex.response_headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_keeps_committed_response() {
        let mut ctx = ProcessingContext::new(RequestId::new());
        let mut ex = Exchange::new(Method::GET, "/", HeaderMap::new());
        ex.text("done").unwrap();

        ResponseCommitStep.run(&mut ctx, &mut ex).await.unwrap();
        assert_eq!(ex.status(), StatusCode::OK);
    }
}
