//! The fixed pipeline stages.
//!
//! Every request passes through these steps in order:
//!
//! 1. **Encoding** - character set setup
//! 2. **Static assets** - registered asset lookup
//! 3. **Routing** - route resolution (404/405 originate here)
//! 4. **Param binding** - path parameters and session attachment
//! 5. **Filter chain** - CORS, nonce, CSRF, authentication, secure
//!    headers, rate limiting, then user filters
//! 6. **Before hooks**
//! 7. **Invocation** - the matched handler runs
//! 8. **After hooks**
//! 9. **Response commit** - request ID header and final flush

mod assets;
mod binding;
mod commit;
mod encoding;
mod filter_chain;
mod hooks;
mod invocation;
mod routing;

pub use assets::StaticAssetsStep;
pub use binding::{ParamBindingStep, SessionLoader};
pub use commit::ResponseCommitStep;
pub use encoding::EncodingStep;
pub use filter_chain::FilterChainStep;
pub use hooks::{AfterHooksStep, BeforeHooksStep, ScopedHook};
pub use invocation::InvocationStep;
pub use routing::RoutingStep;
