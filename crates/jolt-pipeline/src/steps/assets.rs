//! Static asset serving.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::Method;

use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult};

use crate::context::ProcessingContext;
use crate::step::{PipelineStep, StepFlow};

#[derive(Debug, Clone)]
struct Asset {
    content_type: String,
    body: Bytes,
}

/// Serves registered in-memory assets ahead of routing.
///
/// Assets are exact-path entries registered at build time; a request
/// for a path ending in `/` falls back to the `index.html` entry under
/// it. `GET` requests get the body, `HEAD` requests the headers only;
/// other methods fall through to routing.
#[derive(Debug, Clone, Default)]
pub struct StaticAssetsStep {
    assets: HashMap<String, Asset>,
}

impl StaticAssetsStep {
    /// Creates an empty asset store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset at an exact path.
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<Bytes>,
    ) {
        self.assets.insert(
            path.into(),
            Asset {
                content_type: content_type.into(),
                body: body.into(),
            },
        );
    }

    /// Returns the number of registered assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if no assets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn lookup(&self, path: &str) -> Option<&Asset> {
        if let Some(asset) = self.assets.get(path) {
            return Some(asset);
        }
        if path.ends_with('/') {
            return self.assets.get(&format!("{path}index.html"));
        }
        None
    }
}

impl PipelineStep for StaticAssetsStep {
    fn name(&self) -> &'static str {
        "static_assets"
    }

    fn run<'a>(
        &'a self,
        _ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            if ex.method() != Method::GET && ex.method() != Method::HEAD {
                return Ok(StepFlow::Continue);
            }
            let Some(asset) = self.lookup(ex.path()) else {
                return Ok(StepFlow::Continue);
            };

            if ex.method() == Method::HEAD {
                let value = HeaderValue::from_str(&asset.content_type)
                    .map_err(|_| JoltError::internal("invalid asset content type"))?;
                ex.set_header(CONTENT_TYPE, value);
                ex.finish();
            } else {
                ex.bytes(asset.content_type.clone(), asset.body.clone())?;
            }
            Ok(StepFlow::Handled)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use jolt_core::RequestId;

    fn ctx() -> ProcessingContext {
        ProcessingContext::new(RequestId::new())
    }

    fn step() -> StaticAssetsStep {
        let mut step = StaticAssetsStep::new();
        step.insert("/assets/app.css", "text/css", "body { margin: 0 }");
        step
    }

    #[tokio::test]
    async fn test_get_serves_registered_asset() {
        let step = step();
        let mut ex = Exchange::new(Method::GET, "/assets/app.css", HeaderMap::new());
        let flow = step.run(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Handled);
        assert!(ex.committed());
        assert_eq!(ex.response_headers().get("content-type").unwrap(), "text/css");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_through() {
        let step = step();
        let mut ex = Exchange::new(Method::GET, "/assets/missing.css", HeaderMap::new());
        let flow = step.run(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Continue);
        assert!(!ex.committed());
    }

    #[tokio::test]
    async fn test_head_serves_headers_only() {
        let step = step();
        let mut ex = Exchange::new(Method::HEAD, "/assets/app.css", HeaderMap::new());
        let flow = step.run(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Handled);
        assert!(ex.committed());
    }

    #[tokio::test]
    async fn test_directory_path_falls_back_to_index() {
        let mut step = StaticAssetsStep::new();
        step.insert("/docs/index.html", "text/html", "<h1>docs</h1>");

        let mut ex = Exchange::new(Method::GET, "/docs/", HeaderMap::new());
        let flow = step.run(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Handled);
        assert_eq!(ex.response_headers().get("content-type").unwrap(), "text/html");

        // No trailing slash means no index fallback.
        let mut ex = Exchange::new(Method::GET, "/docs", HeaderMap::new());
        let flow = step.run(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Continue);
    }

    #[tokio::test]
    async fn test_post_to_asset_path_falls_through() {
        let step = step();
        let mut ex = Exchange::new(Method::POST, "/assets/app.css", HeaderMap::new());
        let flow = step.run(&mut ctx(), &mut ex).await.unwrap();
        assert_eq!(flow, StepFlow::Continue);
    }
}
