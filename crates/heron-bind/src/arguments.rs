//! The bound argument map.

use indexmap::IndexMap;

use heron_core::Value;

use crate::classifier::Strategy;

/// A value bound to a parameter, with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The bound value.
    pub value: Value,
    /// How it was obtained.
    pub strategy: Strategy,
}

/// Parameter name → bound value, in binding order.
///
/// Each parameter is bound at most once; a second binding for the same name
/// is refused. Parameters that resolved to nothing are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    entries: IndexMap<String, Binding>,
}

impl BoundArguments {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to `name`.
    ///
    /// Returns `false`, leaving the map unchanged, if `name` is already bound.
    pub fn bind(&mut self, name: impl Into<String>, value: Value, strategy: Strategy) -> bool {
        match self.entries.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(Binding { value, strategy });
                true
            }
        }
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|b| &b.value)
    }

    /// Returns the full binding for `name`.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Returns `true` if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes and returns the value bound to `name`.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name).map(|b| b.value)
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the bound names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, b)| (k.as_str(), &b.value))
    }
}
