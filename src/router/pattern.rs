//! Route pattern compilation.
//!
//! Turns a pattern string such as `/users/:id/files/*path` into an ordered list
//! of [`PathSegment`]s. Compilation happens once, at registration time; the
//! resulting [`CompiledPattern`] is immutable and drives trie insertion.
//!
//! ## Grammar
//!
//! Segments are separated by `/`. Empty segments (leading, trailing or doubled
//! slashes) are discarded.
//!
//! | Token          | Segment                  | Constraint          |
//! |----------------|--------------------------|---------------------|
//! | `:name`        | [`PathSegment::Param`]   |                     |
//! | `:name?`       | [`PathSegment::OptionalParam`] | must be last  |
//! | `*name`        | [`PathSegment::Wildcard`] | must be last       |
//! | anything else  | [`PathSegment::Literal`] |                     |
//!
//! Names follow `[A-Za-z_][A-Za-z0-9_]*`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[allow(clippy::expect_used)]
static PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([A-Za-z_][A-Za-z0-9_]*)$").expect("param regex is valid"));

#[allow(clippy::expect_used)]
static OPTIONAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:([A-Za-z_][A-Za-z0-9_]*)\?$").expect("optional param regex is valid")
});

#[allow(clippy::expect_used)]
static WILDCARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*([A-Za-z_][A-Za-z0-9_]*)$").expect("wildcard regex is valid"));

/// Errors raised while compiling a route pattern.
///
/// These are registration-time failures and are meant to abort startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern string was empty.
    #[error("route pattern is empty")]
    Empty,
    /// A wildcard or optional segment was followed by further segments.
    #[error("segment '{segment}' in pattern '{pattern}' must be the last segment")]
    NotTerminal {
        /// The full pattern
        pattern: String,
        /// The offending segment
        segment: String,
    },
    /// The same parameter name was used twice.
    #[error("parameter '{name}' appears more than once in pattern '{pattern}'")]
    DuplicateParam {
        /// The full pattern
        pattern: String,
        /// The repeated name
        name: String,
    },
    /// A `:` or `*` token whose name does not follow the identifier grammar.
    #[error("invalid parameter segment '{segment}' in pattern '{pattern}'")]
    InvalidName {
        /// The full pattern
        pattern: String,
        /// The offending segment
        segment: String,
    },
}

/// A single compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Matches exactly this text (case-sensitive)
    Literal(Arc<str>),
    /// Matches any single segment and binds it
    Param(Arc<str>),
    /// Like `Param` but may be absent; always last
    OptionalParam(Arc<str>),
    /// Binds the remaining path tail; always last
    Wildcard(Arc<str>),
}

impl PathSegment {
    /// Name bound by this segment, if any.
    #[must_use]
    pub fn param_name(&self) -> Option<&Arc<str>> {
        match self {
            PathSegment::Literal(_) => None,
            PathSegment::Param(name)
            | PathSegment::OptionalParam(name)
            | PathSegment::Wildcard(name) => Some(name),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Literal(v) => write!(f, "{v}"),
            PathSegment::Param(n) => write!(f, ":{n}"),
            PathSegment::OptionalParam(n) => write!(f, ":{n}?"),
            PathSegment::Wildcard(n) => write!(f, "*{n}"),
        }
    }
}

/// An immutable, validated route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: Arc<str>,
    segments: Vec<PathSegment>,
}

impl CompiledPattern {
    /// The pattern as it was written at registration.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Segments in path order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Parameter names in descent order.
    #[must_use]
    pub fn param_names(&self) -> Vec<Arc<str>> {
        self.segments
            .iter()
            .filter_map(PathSegment::param_name)
            .cloned()
            .collect()
    }

    /// Whether the final segment is an optional parameter.
    #[must_use]
    pub fn has_optional_tail(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::OptionalParam(_)))
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

fn classify(pattern: &str, token: &str) -> Result<PathSegment, PatternError> {
    if let Some(c) = OPTIONAL_RE.captures(token) {
        return Ok(PathSegment::OptionalParam(Arc::from(&c[1])));
    }
    if let Some(c) = PARAM_RE.captures(token) {
        return Ok(PathSegment::Param(Arc::from(&c[1])));
    }
    if let Some(c) = WILDCARD_RE.captures(token) {
        return Ok(PathSegment::Wildcard(Arc::from(&c[1])));
    }
    if token.starts_with(':') || token.starts_with('*') {
        return Err(PatternError::InvalidName {
            pattern: pattern.to_string(),
            segment: token.to_string(),
        });
    }
    Ok(PathSegment::Literal(Arc::from(token)))
}

/// Compile a pattern string into segments.
///
/// `"/"` compiles to the root pattern (no segments). An empty string is an error.
///
/// # Example
///
/// ```
/// use switchyard::router::{compile, PathSegment};
///
/// let p = compile("/users/:id").unwrap();
/// assert_eq!(p.segments().len(), 2);
/// assert!(matches!(p.segments()[1], PathSegment::Param(_)));
/// ```
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    if pattern.trim().is_empty() {
        return Err(PatternError::Empty);
    }

    let tokens: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(tokens.len());
    let mut seen: Vec<Arc<str>> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        let segment = classify(pattern, token)?;
        let is_last = idx + 1 == tokens.len();

        if matches!(
            segment,
            PathSegment::OptionalParam(_) | PathSegment::Wildcard(_)
        ) && !is_last
        {
            return Err(PatternError::NotTerminal {
                pattern: pattern.to_string(),
                segment: (*token).to_string(),
            });
        }

        if let Some(name) = segment.param_name() {
            if seen.iter().any(|n| n == name) {
                return Err(PatternError::DuplicateParam {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            seen.push(Arc::clone(name));
        }

        segments.push(segment);
    }

    Ok(CompiledPattern {
        source: Arc::from(pattern),
        segments,
    })
}

/// Join a group prefix and a route suffix into one pattern string.
///
/// Slashes at the seam are collapsed; the result always starts with `/`.
#[must_use]
pub fn join_patterns(prefix: &str, suffix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    let mut joined = String::with_capacity(prefix.len() + suffix.len() + 2);
    if !prefix.starts_with('/') {
        joined.push('/');
    }
    joined.push_str(prefix);
    if !suffix.is_empty() {
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(suffix);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_literals() {
        let p = compile("/zoo/animals").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Literal(Arc::from("zoo")),
                PathSegment::Literal(Arc::from("animals"))
            ]
        );
        assert!(p.param_names().is_empty());
    }

    #[test]
    fn test_compile_root() {
        let p = compile("/").unwrap();
        assert!(p.segments().is_empty());
        assert_eq!(p.to_string(), "/");
    }

    #[test]
    fn test_compile_empty_is_error() {
        assert_eq!(compile(""), Err(PatternError::Empty));
        assert_eq!(compile("   "), Err(PatternError::Empty));
    }

    #[test]
    fn test_compile_classifies_every_kind() {
        let p = compile("/a/:b/*rest").unwrap();
        assert!(matches!(p.segments()[0], PathSegment::Literal(_)));
        assert!(matches!(p.segments()[1], PathSegment::Param(_)));
        assert!(matches!(p.segments()[2], PathSegment::Wildcard(_)));

        let p = compile("/posts/:id?").unwrap();
        assert!(p.has_optional_tail());
        assert_eq!(p.param_names(), vec![Arc::<str>::from("id")]);
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let err = compile("/files/*path/meta").unwrap_err();
        assert!(matches!(err, PatternError::NotTerminal { ref segment, .. } if segment == "*path"));
    }

    #[test]
    fn test_optional_must_be_last() {
        let err = compile("/users/:id?/posts").unwrap_err();
        assert!(matches!(err, PatternError::NotTerminal { .. }));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let err = compile("/org/:id/user/:id").unwrap_err();
        assert_eq!(
            err,
            PatternError::DuplicateParam {
                pattern: "/org/:id/user/:id".to_string(),
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_names_rejected() {
        for bad in ["/:", "/:1abc", "/*", "/:na-me", "/*a.b", "/:id??"] {
            assert!(
                matches!(compile(bad), Err(PatternError::InvalidName { .. })),
                "expected InvalidName for {bad}"
            );
        }
    }

    #[test]
    fn test_literal_may_contain_colon_later() {
        let p = compile("/time/12:30").unwrap();
        assert_eq!(p.segments()[1], PathSegment::Literal(Arc::from("12:30")));
    }

    #[test]
    fn test_display_round_trips_shape() {
        let p = compile("//users//:id?").unwrap();
        assert_eq!(p.to_string(), "/users/:id?");
        assert_eq!(p.source(), "//users//:id?");
    }

    #[test]
    fn test_join_patterns() {
        assert_eq!(join_patterns("/api/", "/users"), "/api/users");
        assert_eq!(join_patterns("", "/users"), "/users");
        assert_eq!(join_patterns("api", "users"), "/api/users");
        assert_eq!(join_patterns("/api", "/"), "/api");
        assert_eq!(join_patterns("/", "/"), "/");
    }
}
