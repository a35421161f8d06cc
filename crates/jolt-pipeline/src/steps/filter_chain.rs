//! Filter chain execution.

use std::sync::Arc;

use jolt_core::{BoxFuture, Exchange, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::FilterRegistry;
use crate::step::{PipelineStep, StepFlow};

/// Runs the registered filters that apply to the request path, in order.
///
/// A filter that commits the response or returns
/// [`StepFlow::Handled`] stops the chain and the pipeline.
#[derive(Debug)]
pub struct FilterChainStep {
    registry: Arc<FilterRegistry>,
}

impl FilterChainStep {
    /// Creates the step over a filter registry.
    #[must_use]
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }
}

impl PipelineStep for FilterChainStep {
    fn name(&self) -> &'static str {
        "filters"
    }

    fn run<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            for filter in self.registry.applicable(ex.path()) {
                match filter.apply(ctx, ex).await? {
                    StepFlow::Continue => {}
                    StepFlow::Handled => {
                        tracing::debug!(filter = filter.name(), "filter handled the request");
                        return Ok(StepFlow::Handled);
                    }
                }
                if ex.committed() {
                    tracing::debug!(filter = filter.name(), "filter committed the response");
                    return Ok(StepFlow::Handled);
                }
            }
            Ok(StepFlow::Continue)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Filter;
    use http::{HeaderMap, Method};
    use jolt_core::{JoltError, RequestId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    impl Filter for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn apply<'a>(
            &'a self,
            _ctx: &'a mut ProcessingContext,
            _ex: &'a mut Exchange,
        ) -> BoxFuture<'a, JoltResult<StepFlow>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(StepFlow::Continue) })
        }
    }

    struct Halting;

    impl Filter for Halting {
        fn name(&self) -> &'static str {
            "halting"
        }

        fn apply<'a>(
            &'a self,
            _ctx: &'a mut ProcessingContext,
            ex: &'a mut Exchange,
        ) -> BoxFuture<'a, JoltResult<StepFlow>> {
            Box::pin(async move {
                ex.text("halted")?;
                Ok(StepFlow::Handled)
            })
        }
    }

    struct Failing;

    impl Filter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn apply<'a>(
            &'a self,
            _ctx: &'a mut ProcessingContext,
            _ex: &'a mut Exchange,
        ) -> BoxFuture<'a, JoltResult<StepFlow>> {
            Box::pin(async { Err(JoltError::forbidden("nope")) })
        }
    }

    fn run_chain(
        registry: FilterRegistry,
    ) -> impl std::future::Future<Output = JoltResult<StepFlow>> {
        let step = FilterChainStep::new(Arc::new(registry));
        async move {
            let mut ctx = ProcessingContext::new(RequestId::new());
            let mut ex = Exchange::new(Method::GET, "/", HeaderMap::new());
            step.run(&mut ctx, &mut ex).await
        }
    }

    #[tokio::test]
    async fn test_all_filters_run_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = FilterRegistry::new();
        registry.register(0, Arc::new(Counting(counter.clone())));
        registry.register(1, Arc::new(Counting(counter.clone())));

        let flow = run_chain(registry).await.unwrap();
        assert_eq!(flow, StepFlow::Continue);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handled_stops_the_chain() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = FilterRegistry::new();
        registry.register(0, Arc::new(Halting));
        registry.register(1, Arc::new(Counting(counter.clone())));

        let flow = run_chain(registry).await.unwrap();
        assert_eq!(flow, StepFlow::Handled);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let mut registry = FilterRegistry::new();
        registry.register(0, Arc::new(Failing));
        assert!(run_chain(registry).await.is_err());
    }
}
