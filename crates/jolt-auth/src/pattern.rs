//! Route pattern DSL compiler.
//!
//! Patterns are literal paths with two wildcard forms: `*` matches exactly
//! one path segment (never crossing a `/`), and `**` matches zero or more
//! segments. A pattern compiles to an anchored regex in a single
//! left-to-right pass; regex metacharacters in literal segments are
//! escaped so they match literally.
//!
//! The compiler performs no slash normalization; callers normalize the
//! request path before matching.

use regex::Regex;
use thiserror::Error;

/// Errors from pattern compilation.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The compiled expression was rejected by the regex engine.
    #[error("invalid route pattern {pattern:?}: {source}")]
    Invalid {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// A compiled route pattern.
///
/// # Example
///
/// ```
/// use jolt_auth::PathPattern;
///
/// let api = PathPattern::compile("/api/**").unwrap();
/// assert!(api.matches("/api/v1/users"));
///
/// let user = PathPattern::compile("/users/*").unwrap();
/// assert!(user.matches("/users/42"));
/// assert!(!user.matches("/users/42/edit"));
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
}

impl PathPattern {
    /// Compiles a pattern into a matcher.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '*' {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    expr.push_str(".*");
                } else {
                    expr.push_str("[^/]+");
                }
            } else {
                if is_meta(c) {
                    expr.push('\\');
                }
                expr.push(c);
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|source| PatternError::Invalid {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Returns true if the full request path matches this pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the original pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn is_meta(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '[' | ']' | '{' | '}' | '(' | ')' | '+' | '-' | '^' | '$' | '|' | '?'
    )
}
