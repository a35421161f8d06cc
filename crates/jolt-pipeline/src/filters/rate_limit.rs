//! Sliding-window rate limiting.
//!
//! Tracks request counts per key in two adjacent windows and weights the
//! previous window by how far the current one has progressed, which
//! smooths the boundary a fixed window would have. The check and the
//! count increment happen under one lock so concurrent requests cannot
//! both slip past the limit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::HeaderValue;
use tokio::sync::Mutex;

use jolt_core::{BoxFuture, Exchange, JoltError, JoltResult};

use crate::context::ProcessingContext;
use crate::filters::Filter;
use crate::step::StepFlow;

/// Rate limit response header names.
pub mod rate_limit_headers {
    /// Maximum requests allowed in the window.
    pub const LIMIT: &str = "x-ratelimit-limit";
    /// Remaining requests in the current window.
    pub const REMAINING: &str = "x-ratelimit-remaining";
    /// Seconds until the window resets.
    pub const RESET_AFTER: &str = "x-ratelimit-reset-after";
}

/// How to derive the rate limit key from a request.
#[derive(Clone, Default)]
pub enum RateKey {
    /// Client IP from `X-Forwarded-For` / `X-Real-IP`.
    #[default]
    Ip,
    /// A named request header (API keys).
    Header(String),
    /// One shared bucket for all requests.
    Global,
    /// Caller-supplied extraction.
    Custom(Arc<dyn Fn(&Exchange) -> Option<String> + Send + Sync>),
}

impl std::fmt::Debug for RateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ip => f.write_str("RateKey::Ip"),
            Self::Header(h) => f.debug_tuple("RateKey::Header").field(h).finish(),
            Self::Global => f.write_str("RateKey::Global"),
            Self::Custom(_) => f.write_str("RateKey::Custom(<fn>)"),
        }
    }
}

#[derive(Debug, Clone)]
struct WindowData {
    count: u64,
    window_start: Instant,
    prev_count: u64,
}

#[derive(Debug, Default)]
struct LimiterStore {
    windows: HashMap<String, WindowData>,
}

#[derive(Debug, Clone)]
enum Verdict {
    Allowed { remaining: u64, reset_in: Duration },
    Limited { reset_in: Duration },
}

/// Rate limiting filter.
///
/// Requests over the limit are rejected with `429 Too Many Requests`
/// and a `Retry-After` header; allowed requests get the
/// `X-RateLimit-*` headers.
#[derive(Debug)]
pub struct RateLimitFilter {
    limit: u64,
    window: Duration,
    key: RateKey,
    store: Arc<Mutex<LimiterStore>>,
}

impl RateLimitFilter {
    /// Creates a rate limit builder.
    #[must_use]
    pub fn builder() -> RateLimitBuilder {
        RateLimitBuilder::new()
    }

    fn extract_key(&self, ex: &Exchange) -> Option<String> {
        match &self.key {
            RateKey::Ip => {
                if let Some(xff) = ex.header("x-forwarded-for") {
                    // The list may hold several hops; the first is the client.
                    return Some(xff.split(',').next()?.trim().to_string());
                }
                if let Some(real_ip) = ex.header("x-real-ip") {
                    return Some(real_ip.to_string());
                }
                Some("unknown-ip".to_string())
            }
            RateKey::Header(name) => ex.header(name).map(String::from),
            RateKey::Global => Some("global".to_string()),
            RateKey::Custom(f) => f(ex),
        }
    }

    /// Atomically checks the window and records the request.
    #[allow(clippy::significant_drop_tightening)]
    async fn check_and_record(&self, key: &str) -> Verdict {
        let mut store = self.store.lock().await;
        let now = Instant::now();
        let window = self.window;

        let data = store
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowData {
                count: 0,
                window_start: now,
                prev_count: 0,
            });

        let elapsed = now.duration_since(data.window_start);
        if elapsed >= window {
            let windows_passed = elapsed.as_secs() / window.as_secs().max(1);
            data.prev_count = if windows_passed >= 2 { 0 } else { data.count };
            data.count = 0;
            data.window_start = now;
        }

        let progress =
            now.duration_since(data.window_start).as_secs_f64() / window.as_secs_f64();
        let prev_weight = 1.0 - progress;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let weighted = data.count + (data.prev_count as f64 * prev_weight) as u64;

        let reset_in = window.saturating_sub(now.duration_since(data.window_start));
        if weighted >= self.limit {
            Verdict::Limited { reset_in }
        } else {
            data.count += 1;
            Verdict::Allowed {
                remaining: self.limit.saturating_sub(weighted + 1),
                reset_in,
            }
        }
    }
}

impl Filter for RateLimitFilter {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    fn apply<'a>(
        &'a self,
        _ctx: &'a mut ProcessingContext,
        ex: &'a mut Exchange,
    ) -> BoxFuture<'a, JoltResult<StepFlow>> {
        Box::pin(async move {
            let Some(key) = self.extract_key(ex) else {
                // No key means no bucket to charge; let the request pass.
                return Ok(StepFlow::Continue);
            };

            match self.check_and_record(&key).await {
                Verdict::Allowed {
                    remaining,
                    reset_in,
                } => {
                    ex.set_header(
                        http::HeaderName::from_static(rate_limit_headers::LIMIT),
                        HeaderValue::from(self.limit),
                    );
                    ex.set_header(
                        http::HeaderName::from_static(rate_limit_headers::REMAINING),
                        HeaderValue::from(remaining),
                    );
                    ex.set_header(
                        http::HeaderName::from_static(rate_limit_headers::RESET_AFTER),
                        HeaderValue::from(reset_in.as_secs()),
                    );
                    Ok(StepFlow::Continue)
                }
                Verdict::Limited { reset_in } => {
                    tracing::debug!(%key, "rate limit exceeded");
                    Err(JoltError::RateLimited {
                        retry_after_seconds: reset_in.as_secs().max(1),
                    })
                }
            }
        })
    }
}

/// Builder for [`RateLimitFilter`].
#[derive(Debug, Clone)]
pub struct RateLimitBuilder {
    limit: u64,
    window: Duration,
    key: RateKey,
}

impl Default for RateLimitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitBuilder {
    /// Creates a builder with defaults of 100 requests per 60 seconds,
    /// keyed by client IP.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(60),
            key: RateKey::default(),
        }
    }

    /// Sets the maximum requests per window.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the window length.
    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the window length in seconds.
    #[must_use]
    pub fn window_secs(self, seconds: u64) -> Self {
        self.window(Duration::from_secs(seconds))
    }

    /// Keys buckets by client IP.
    #[must_use]
    pub fn per_ip(mut self) -> Self {
        self.key = RateKey::Ip;
        self
    }

    /// Keys buckets by a request header value.
    #[must_use]
    pub fn per_header(mut self, name: impl Into<String>) -> Self {
        self.key = RateKey::Header(name.into());
        self
    }

    /// Uses one shared bucket for all requests.
    #[must_use]
    pub fn global(mut self) -> Self {
        self.key = RateKey::Global;
        self
    }

    /// Keys buckets with a custom extraction function.
    #[must_use]
    pub fn key_extractor<F>(mut self, f: F) -> Self
    where
        F: Fn(&Exchange) -> Option<String> + Send + Sync + 'static,
    {
        self.key = RateKey::Custom(Arc::new(f));
        self
    }

    /// Builds the filter.
    #[must_use]
    pub fn build(self) -> RateLimitFilter {
        RateLimitFilter {
            limit: self.limit,
            window: self.window,
            key: self.key,
            store: Arc::new(Mutex::new(LimiterStore::default())),
        }
    }
}
