//! Per-request script nonce generation.

use jolt_core::{BoxFuture, Exchange, JoltResult};
use uuid::Uuid;

use crate::context::ProcessingContext;
use crate::filters::Filter;
use crate::step::StepFlow;

/// The nonce generated for the current request.
///
/// Stored as a context extension so later filters (the secure-headers
/// CSP) and handlers rendering inline scripts can read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNonce(pub String);

impl ScriptNonce {
    /// Returns the nonce value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Generates a fresh random nonce for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonceFilter;

impl Filter for NonceFilter {
    fn name(&self) -> &'static str {
        "nonce"
    }

    fn apply<'a>(
        &'a self,
        ctx: &'a mut ProcessingContext,
        _ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            ctx.insert_extension(ScriptNonce(Uuid::new_v4().simple().to_string()));
            Ok(StepFlow::Continue)
        })
    }
}
