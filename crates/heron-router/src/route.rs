//! The matched route object.
//!
//! A [`Route`] pairs a path pattern with the [`Action`] it dispatches to.
//! Patterns use `{name}` for required segments and `{name?}` for optional
//! ones; the dispatcher asks [`Route::is_optional_param`] when a parameter
//! has no attribute value.

use heron_core::Action;

/// Type of path segment in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "posts", "api")
    Static,
    /// Named parameter (e.g., "{id}", "{page?}")
    Param {
        /// Parameter name, without braces or the `?` marker.
        name: String,
        /// `true` for `{name?}` segments.
        optional: bool,
    },
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

/// One segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The segment as written in the pattern.
    pub raw: String,
    /// What the segment matches.
    pub kind: SegmentKind,
}

impl Segment {
    /// Returns the parameter name for param and wildcard segments.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Static => None,
            SegmentKind::Param { name, .. } | SegmentKind::Wildcard(name) => Some(name),
        }
    }
}

/// A route the router matched for the current request.
///
/// # Example
///
/// ```rust
/// use heron_core::Action;
/// use heron_router::Route;
///
/// let route = Route::new("/posts/{post}/comments/{page?}", Action::named("PostController", "show"));
///
/// assert_eq!(route.params().collect::<Vec<_>>(), vec!["post", "page"]);
/// assert!(route.is_optional_param("page"));
/// assert!(!route.is_optional_param("post"));
/// ```
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    name: Option<String>,
    action: Action,
    segments: Vec<Segment>,
}

impl Route {
    /// Creates a route, parsing its pattern.
    pub fn new(pattern: impl Into<String>, action: Action) -> Self {
        let pattern = pattern.into();
        let segments = parse_pattern(&pattern);
        Self {
            pattern,
            name: None,
            action,
            segments,
        }
    }

    /// Sets the route name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the route name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the action this route dispatches to.
    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the parameter names in pattern order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Returns `true` if `name` is declared as an optional segment.
    #[must_use]
    pub fn is_optional_param(&self, name: &str) -> bool {
        self.segments.iter().any(|s| {
            matches!(&s.kind, SegmentKind::Param { name: n, optional: true } if n == name)
        })
    }
}

/// Parses a pattern into segments.
fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let kind = if let Some(inner) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                match inner.strip_suffix('?') {
                    Some(name) => SegmentKind::Param {
                        name: name.to_string(),
                        optional: true,
                    },
                    None => SegmentKind::Param {
                        name: inner.to_string(),
                        optional: false,
                    },
                }
            } else if let Some(name) = s.strip_prefix('*') {
                SegmentKind::Wildcard(name.to_string())
            } else {
                SegmentKind::Static
            };
            Segment {
                raw: s.to_string(),
                kind,
            }
        })
        .collect()
}
