//! Route attributes attached to a request.
//!
//! The router stores the values it extracted from the path and query, plus
//! the matched [`Route`] itself under [`ROUTE_ATTRIBUTE`], as a
//! [`RouteAttributes`] request extension. Small-vector storage avoids heap
//! allocation for the common case of a handful of attributes.

use std::sync::Arc;

use heron_core::Value;
use smallvec::SmallVec;

use crate::route::Route;

/// Reserved attribute name carrying the matched route.
pub const ROUTE_ATTRIBUTE: &str = "_route";

/// Maximum number of attributes stored inline (stack allocated).
const INLINE_ATTRIBUTES: usize = 4;

/// A single route attribute.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A value extracted from the request.
    Value(Value),
    /// The matched route.
    Route(Arc<Route>),
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Route(a), Self::Route(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Ordered route attributes for one request.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use heron_core::{Action, Value};
/// use heron_router::{Route, RouteAttributes};
///
/// let route = Arc::new(Route::new("/posts/{post}", Action::named("PostController", "show")));
/// let attributes = RouteAttributes::for_route(route).with("post", "7");
///
/// assert_eq!(attributes.get("post"), Some(&Value::from("7")));
///
/// let (route, values) = attributes.split_route();
/// assert!(route.is_some());
/// assert_eq!(values.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteAttributes {
    inner: SmallVec<[(String, Attribute); INLINE_ATTRIBUTES]>,
}

impl RouteAttributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an attribute set carrying the matched route.
    #[must_use]
    pub fn for_route(route: Arc<Route>) -> Self {
        let mut attributes = Self::new();
        attributes.set(ROUTE_ATTRIBUTE, Attribute::Route(route));
        attributes
    }

    /// Sets an attribute, replacing an existing one in place.
    pub fn set(&mut self, name: impl Into<String>, attribute: Attribute) {
        let name = name.into();
        match self.inner.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.inner.push((name, attribute)),
        }
    }

    /// Sets a value attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set(name, Attribute::Value(value.into()));
    }

    /// Builder form of [`RouteAttributes::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value attribute for `name`.
    ///
    /// The route entry is never returned here.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.iter().find_map(|(n, a)| match a {
            Attribute::Value(v) if n == name => Some(v),
            _ => None,
        })
    }

    /// Returns the matched route, if attached.
    #[must_use]
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.inner.iter().find_map(|(n, a)| match a {
            Attribute::Route(r) if n == ROUTE_ATTRIBUTE => Some(r),
            _ => None,
        })
    }

    /// Separates the matched route from the value attributes.
    ///
    /// Anything stored under the reserved name is removed, so an action
    /// parameter can never bind the route object.
    #[must_use]
    pub fn split_route(self) -> (Option<Arc<Route>>, Self) {
        let mut route = None;
        let mut rest = Self::new();
        for (name, attribute) in self.inner {
            match attribute {
                Attribute::Route(r) if name == ROUTE_ATTRIBUTE => route = Some(r),
                _ if name == ROUTE_ATTRIBUTE => {}
                other => rest.inner.push((name, other)),
            }
        }
        (route, rest)
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of attributes, the route entry included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the value attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.inner.iter().filter_map(|(n, a)| match a {
            Attribute::Value(v) => Some((n.as_str(), v)),
            Attribute::Route(_) => None,
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RouteAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::Action;

    fn route() -> Arc<Route> {
        Arc::new(Route::new("/posts/{post}", Action::named("PostController", "show")))
    }

    #[test]
    fn test_attributes_new() {
        let attributes = RouteAttributes::new();
        assert!(attributes.is_empty());
        assert!(attributes.route().is_none());
    }

    #[test]
    fn test_insert_and_get() {
        let mut attributes = RouteAttributes::new();
        attributes.insert("post", "7");
        attributes.insert("id", 99);

        assert_eq!(attributes.get("post"), Some(&Value::from("7")));
        assert_eq!(attributes.get("id"), Some(&Value::Int(99)));
        assert_eq!(attributes.get("unknown"), None);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let attributes = RouteAttributes::new()
            .with("a", "1")
            .with("b", "2")
            .with("a", "3");

        let pairs: Vec<_> = attributes.iter().collect();
        assert_eq!(pairs, vec![("a", &Value::from("3")), ("b", &Value::from("2"))]);
    }

    #[test]
    fn test_route_entry_is_hidden_from_get() {
        let attributes = RouteAttributes::for_route(route()).with("post", "7");
        assert!(attributes.get(ROUTE_ATTRIBUTE).is_none());
        assert!(attributes.route().is_some());
        assert_eq!(attributes.iter().count(), 1);
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_split_route() {
        let r = route();
        let attributes = RouteAttributes::for_route(r.clone()).with("post", "7");

        let (found, rest) = attributes.split_route();
        assert!(Arc::ptr_eq(&found.unwrap(), &r));
        assert_eq!(rest.len(), 1);
        assert!(rest.route().is_none());
    }

    #[test]
    fn test_split_route_drops_reserved_value() {
        let attributes = RouteAttributes::new().with(ROUTE_ATTRIBUTE, "spoofed");
        let (found, rest) = attributes.split_route();
        assert!(found.is_none());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_from_iterator_with_many_attributes() {
        let attributes: RouteAttributes = (0..10).map(|i| (format!("key{i}"), i)).collect();
        assert_eq!(attributes.len(), 10);
        assert_eq!(attributes.get("key5"), Some(&Value::Int(5)));
    }
}
