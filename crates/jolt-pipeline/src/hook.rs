//! Before/after request hooks.
//!
//! Hooks are the pipeline's user extension points around handler
//! invocation. Before-hooks run once routing and filters have passed; a
//! before-hook that commits the response suppresses handler invocation.
//! After-hooks run after the handler, whether or not it committed, and
//! are the place for response post-processing and request logging.

use std::sync::Arc;

use jolt_core::{BoxFuture, Exchange, JoltResult};

/// A request hook.
pub trait Hook: Send + Sync {
    /// Runs the hook.
    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, JoltResult<()>>;
}

/// The type-erased hook reference stored by the pipeline.
pub type BoxedHook = Arc<dyn Hook>;

impl<T: Hook + ?Sized> Hook for Arc<T> {
    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, JoltResult<()>> {
        (**self).call(ex)
    }
}

struct FnHook<F> {
    func: F,
}

impl<F> Hook for FnHook<F>
where
    F: Fn(&mut Exchange) -> JoltResult<()> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ex: &'a mut Exchange) -> BoxFuture<'a, JoltResult<()>> {
        let result = (self.func)(ex);
        Box::pin(async move { result })
    }
}

/// Wraps a synchronous closure as a hook.
pub fn hook_fn<F>(func: F) -> BoxedHook
where
    F: Fn(&mut Exchange) -> JoltResult<()> + Send + Sync + 'static,
{
    Arc::new(FnHook { func })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, Method};

    #[tokio::test]
    async fn test_hook_runs_against_exchange() {
        let hook = hook_fn(|ex| {
            ex.set_charset("iso-8859-1");
            Ok(())
        });
        let mut ex = Exchange::new(Method::GET, "/", HeaderMap::new());
        hook.call(&mut ex).await.unwrap();
    }
}
