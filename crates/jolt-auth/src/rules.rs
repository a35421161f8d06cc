//! Ordered rule sets and the rule-building DSL.
//!
//! Rules are evaluated in declaration order and the first rule whose path
//! pattern and method set match the request wins; later rules are never
//! consulted. A request matching no rule at all is allowed through, so a
//! deployment that wants default-deny ends its rule set with a
//! deny-everything rule.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::Method;
use serde_json::Value;

use jolt_core::Exchange;

use crate::pattern::{PathPattern, PatternError};
use crate::rule::{Access, FailureHandler, RouteRule};
use crate::strategy::{AuthStrategy, SessionStrategy};
use crate::AccessDecision;

/// An ordered, first-match-wins set of access rules.
///
/// # Example
///
/// ```
/// use jolt_auth::RouteRules;
/// use http::Method;
///
/// let rules = RouteRules::builder()
///     .route("/public/**").permit()
///     .route("/internal/**").deny()
///     .route("/admin/**").authenticated()
///     .build()
///     .unwrap();
///
/// assert!(rules.first_match("/public/css/app.css", &Method::GET).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteRules {
    rules: Vec<RouteRule>,
}

impl RouteRules {
    /// Returns an empty rule set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts a rule-set builder.
    #[must_use]
    pub fn builder() -> RouteRulesBuilder {
        RouteRulesBuilder::new()
    }

    /// Appends another rule set after this one.
    ///
    /// The receiver's rules keep priority: a request is tested against all
    /// of `self` before any rule from `other`. The pipeline uses this to
    /// evaluate centrally configured rules ahead of per-controller rules.
    #[must_use]
    pub fn merge(mut self, other: RouteRules) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Returns the first rule matching the path and method, if any.
    #[must_use]
    pub fn first_match(&self, path: &str, method: &Method) -> Option<&RouteRule> {
        self.rules.iter().find(|r| r.matches(path, method))
    }

    /// Iterates the rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &RouteRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for [`RouteRules`].
///
/// Pattern compilation errors are deferred so the chain stays infallible;
/// [`RouteRulesBuilder::build`] reports the first error encountered.
///
/// Rules that require authentication without naming a strategy fall back
/// to the builder's default strategy, which starts as [`SessionStrategy`].
/// Clearing the default leaves such rules without a strategy, and the
/// engine rejects requests matching them.
pub struct RouteRulesBuilder {
    rules: Vec<RouteRule>,
    default_strategy: Option<Arc<dyn AuthStrategy>>,
    error: Option<PatternError>,
}

impl Default for RouteRulesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteRulesBuilder {
    /// Creates a builder with [`SessionStrategy`] as the default strategy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_strategy: Some(Arc::new(SessionStrategy::new())),
            error: None,
        }
    }

    /// Sets the strategy used by rules that require authentication
    /// without naming one.
    #[must_use]
    pub fn default_strategy(mut self, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.default_strategy = Some(strategy);
        self
    }

    /// Removes the default strategy.
    #[must_use]
    pub fn clear_default_strategy(mut self) -> Self {
        self.default_strategy = None;
        self
    }

    /// Starts a rule scoped to a path pattern.
    #[must_use]
    pub fn route(mut self, pattern: &str) -> RuleBuilder {
        let compiled = match PathPattern::compile(pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
                None
            }
        };
        RuleBuilder::new(self, compiled, false)
    }

    /// Starts a rule matching every path.
    #[must_use]
    pub fn any_route(self) -> RuleBuilder {
        RuleBuilder::new(self, None, true)
    }

    /// Finalizes the rule set.
    ///
    /// # Errors
    ///
    /// Returns the first pattern compilation error recorded while chaining.
    pub fn build(mut self) -> Result<RouteRules, PatternError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        // Fill in the default strategy for rules that did not name one.
        for rule in &mut self.rules {
            if let Access::Authenticated(strategy @ None) = &mut rule.access {
                *strategy = self.default_strategy.clone();
            }
        }
        Ok(RouteRules { rules: self.rules })
    }

    fn push(mut self, rule: RouteRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Builder for a single rule; terminal methods return the parent builder.
pub struct RuleBuilder {
    parent: RouteRulesBuilder,
    pattern: Option<PathPattern>,
    any_path: bool,
    methods: Option<HashSet<Method>>,
    strategy: Option<Arc<dyn AuthStrategy>>,
    required_credentials: HashMap<String, Value>,
    on_failure: Option<FailureHandler>,
}

impl RuleBuilder {
    fn new(parent: RouteRulesBuilder, pattern: Option<PathPattern>, any_path: bool) -> Self {
        Self {
            parent,
            pattern,
            any_path,
            methods: None,
            strategy: None,
            required_credentials: HashMap::new(),
            on_failure: None,
        }
    }

    /// Restricts the rule to the given methods. An empty set is treated
    /// as no restriction.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Names the strategy used when this rule requires authentication.
    #[must_use]
    pub fn strategy(mut self, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Requires an authenticated credential to hold the expected value.
    ///
    /// Values are compared type-tolerantly; a missing or mismatched
    /// credential rejects the request even though authentication itself
    /// succeeded.
    #[must_use]
    pub fn require(mut self, key: impl Into<String>, expected: Value) -> Self {
        self.required_credentials.insert(key.into(), expected);
        self
    }

    /// On authentication failure, redirect instead of challenging.
    #[must_use]
    pub fn on_failure_redirect(mut self, location: impl Into<String>) -> Self {
        self.on_failure
            .get_or_insert_with(FailureHandler::default)
            .redirect = Some(location.into());
        self
    }

    /// On authentication failure, decide the outcome with a callback.
    ///
    /// Takes precedence over a redirect if both are set.
    #[must_use]
    pub fn on_failure_with(
        mut self,
        callback: impl Fn(&Exchange) -> AccessDecision + Send + Sync + 'static,
    ) -> Self {
        self.on_failure
            .get_or_insert_with(FailureHandler::default)
            .callback = Some(Arc::new(callback));
        self
    }

    /// Finishes the rule as permit-all.
    #[must_use]
    pub fn permit(self) -> RouteRulesBuilder {
        self.finish(Access::Permit)
    }

    /// Finishes the rule as deny-all.
    #[must_use]
    pub fn deny(self) -> RouteRulesBuilder {
        self.finish(Access::Deny)
    }

    /// Finishes the rule as authentication-required.
    #[must_use]
    pub fn authenticated(self) -> RouteRulesBuilder {
        let strategy = self.strategy.clone();
        self.finish(Access::Authenticated(strategy))
    }

    fn finish(self, access: Access) -> RouteRulesBuilder {
        self.parent.push(RouteRule {
            pattern: self.pattern,
            any_path: self.any_path,
            methods: self.methods,
            access,
            required_credentials: self.required_credentials,
            on_failure: self.on_failure,
        })
    }
}
