//! Dynamic values exchanged between routes, the container, and actions.
//!
//! Route attributes arrive as loosely typed data (mostly text), while the
//! container hands out shared objects. [`Value`] covers both so a single
//! argument list can carry either.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BindingError;

/// Floats in this range convert to `i64` without saturating.
const I64_RANGE: std::ops::Range<f64> = i64::MIN as f64..i64::MAX as f64;

/// A builtin scalar type that an action parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// Text.
    String,
    /// Ordered list of values.
    Array,
    /// Any value, no coercion applied.
    Mixed,
}

impl ScalarType {
    /// Returns the lowercase name of the scalar type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability implemented by persisted domain records.
///
/// The container recognises an [`Instance`] built with [`Instance::entity`]
/// as an entity and routes it through entity hydration instead of handing
/// the raw attribute to the action.
pub trait Entity: Any + Send + Sync {
    /// Logical name of the entity (for example `"post"`).
    fn entity_name(&self) -> &str;

    /// The primary key of a hydrated record, or `None` for a prototype.
    fn primary_key(&self) -> Option<Value> {
        None
    }
}

/// A shared, type-erased object produced by the container.
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
    entity: Option<Arc<dyn Entity>>,
}

impl Instance {
    /// Wraps a plain service object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared service object.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            type_name: Arc::from(std::any::type_name::<T>()),
            inner: value,
            entity: None,
        }
    }

    /// Wraps a domain entity, exposing its [`Entity`] view.
    pub fn entity<T: Entity>(value: T) -> Self {
        let shared = Arc::new(value);
        Self {
            type_name: Arc::from(std::any::type_name::<T>()),
            inner: shared.clone(),
            entity: Some(shared),
        }
    }

    /// Wraps a trait object so it can be resolved by interface name.
    ///
    /// The instance is keyed by `type_name::<I>()` (for example
    /// `dyn app::Logger`) and can be read back with [`Instance::as_interface`].
    pub fn interface<I: ?Sized + Send + Sync + 'static>(value: Arc<I>) -> Self {
        Self {
            type_name: Arc::from(std::any::type_name::<I>()),
            inner: Arc::new(value),
            entity: None,
        }
    }

    /// Overrides the type name reported by this instance.
    #[must_use]
    pub fn named(mut self, type_name: impl Into<Arc<str>>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Returns the type name this instance was registered under.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the entity view when this instance is a domain entity.
    #[must_use]
    pub fn as_entity(&self) -> Option<&dyn Entity> {
        self.entity.as_deref()
    }

    /// Returns `true` if this instance carries the entity capability.
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.entity.is_some()
    }

    /// Downcasts to a concrete shared type.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Borrows the inner object as a concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Reads back a trait object stored with [`Instance::interface`].
    #[must_use]
    pub fn as_interface<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
        self.inner.downcast_ref::<Arc<I>>().cloned()
    }

    /// Returns `true` if both instances share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("entity", &self.is_entity())
            .finish()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// A dynamically typed argument value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The explicit absence-value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Object produced by the container.
    Instance(Instance),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Loose emptiness check used when deciding whether a route attribute
    /// is present.
    ///
    /// `Null`, `false`, `0`, `0.0`, `""`, `"0"` and `[]` are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty() || s == "0",
            Self::List(items) => items.is_empty(),
            Self::Instance(_) => false,
        }
    }

    /// Returns the text if this is a [`Value::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the instance if this is a [`Value::Instance`].
    #[must_use]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::List(_) => "array",
            Self::Instance(_) => "object",
        }
    }

    /// Renders the value as text.
    ///
    /// Scalars convert the way a loosely typed runtime casts them
    /// (`true` becomes `"1"`, `false` and `Null` become `""`).
    /// Lists and instances have no text form.
    pub fn to_text(&self) -> Result<String, BindingError> {
        match self {
            Self::Null | Self::Bool(false) => Ok(String::new()),
            Self::Bool(true) => Ok("1".to_string()),
            Self::Int(i) => Ok(i.to_string()),
            Self::Float(f) => Ok(f.to_string()),
            Self::Text(s) => Ok(s.clone()),
            Self::List(_) | Self::Instance(_) => {
                Err(BindingError::coercion(self.kind(), ScalarType::String))
            }
        }
    }

    /// Coerces the value into the given builtin scalar type.
    ///
    /// `Null` is never coerced; callers decide whether the absence-value is
    /// acceptable for the parameter.
    pub fn coerce_to(self, target: ScalarType) -> Result<Value, BindingError> {
        let fail = |v: &Value| BindingError::coercion(v.kind(), target);
        match (target, self) {
            (_, Self::Null) => Ok(Self::Null),
            (ScalarType::Mixed, v) => Ok(v),

            (ScalarType::Int, Self::Int(i)) => Ok(Self::Int(i)),
            (ScalarType::Int, Self::Bool(b)) => Ok(Self::Int(i64::from(b))),
            (ScalarType::Int, Self::Float(f)) if f.fract() == 0.0 && I64_RANGE.contains(&f) => {
                Ok(Self::Int(f as i64))
            }
            (ScalarType::Int, Self::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|_| fail(&Self::Text(s))),

            (ScalarType::Float, Self::Float(f)) => Ok(Self::Float(f)),
            (ScalarType::Float, Self::Int(i)) => Ok(Self::Float(i as f64)),
            (ScalarType::Float, Self::Bool(b)) => Ok(Self::Float(if b { 1.0 } else { 0.0 })),
            (ScalarType::Float, Self::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Self::Float)
                .map_err(|_| fail(&Self::Text(s))),

            (ScalarType::Bool, v @ (Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Text(_))) => {
                Ok(Self::Bool(!v.is_empty()))
            }

            (ScalarType::String, v) => v.to_text().map(Self::Text),

            (ScalarType::Array, Self::List(items)) => Ok(Self::List(items)),

            (_, v) => Err(fail(&v)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Instance> for Value {
    fn from(i: Instance) -> Self {
        Self::Instance(i)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Post {
        id: Option<i64>,
    }

    impl Entity for Post {
        fn entity_name(&self) -> &str {
            "post"
        }

        fn primary_key(&self) -> Option<Value> {
            self.id.map(Value::Int)
        }
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_emptiness_follows_loose_rules() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::from("0").is_empty());
        assert!(Value::Int(0).is_empty());
        assert!(Value::Bool(false).is_empty());
        assert!(Value::List(vec![]).is_empty());

        assert!(!Value::from("7").is_empty());
        assert!(!Value::from("00").is_empty());
        assert!(!Value::Int(-1).is_empty());
        assert!(!Value::Instance(Instance::new(1u8)).is_empty());
    }

    #[test]
    fn test_to_text_casts_scalars() {
        assert_eq!(Value::Int(42).to_text().unwrap(), "42");
        assert_eq!(Value::Bool(true).to_text().unwrap(), "1");
        assert_eq!(Value::Bool(false).to_text().unwrap(), "");
        assert_eq!(Value::Null.to_text().unwrap(), "");
        assert!(Value::List(vec![]).to_text().is_err());
    }

    #[test]
    fn test_coerce_text_to_int() {
        assert_eq!(Value::from("99").coerce_to(ScalarType::Int).unwrap(), Value::Int(99));
        assert_eq!(Value::from(" 7 ").coerce_to(ScalarType::Int).unwrap(), Value::Int(7));
        assert!(Value::from("abc").coerce_to(ScalarType::Int).is_err());
        assert!(Value::Float(1.5).coerce_to(ScalarType::Int).is_err());
    }

    #[test]
    fn test_coerce_float_to_int_rejects_out_of_range() {
        assert_eq!(Value::Float(42.0).coerce_to(ScalarType::Int).unwrap(), Value::Int(42));
        assert_eq!(
            Value::Float(-9_007_199_254_740_992.0).coerce_to(ScalarType::Int).unwrap(),
            Value::Int(-9_007_199_254_740_992)
        );

        for f in [1e20, -1e20, 9_223_372_036_854_775_808.0, f64::NAN, f64::INFINITY] {
            let err = Value::Float(f).coerce_to(ScalarType::Int).unwrap_err();
            assert_eq!(err, BindingError::coercion("float", ScalarType::Int), "{f}");
        }
    }

    #[test]
    fn test_scalar_type_serde_uses_names() {
        for ty in [
            ScalarType::Int,
            ScalarType::Float,
            ScalarType::Bool,
            ScalarType::String,
            ScalarType::Array,
            ScalarType::Mixed,
        ] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.name()));
            assert_eq!(serde_json::from_str::<ScalarType>(&json).unwrap(), ty);
        }
    }

    #[test]
    fn test_coerce_preserves_null() {
        assert_eq!(Value::Null.coerce_to(ScalarType::Int).unwrap(), Value::Null);
    }

    #[test]
    fn test_coerce_to_bool_and_float() {
        assert_eq!(Value::from("1").coerce_to(ScalarType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(Value::from("0").coerce_to(ScalarType::Bool).unwrap(), Value::Bool(false));
        assert_eq!(Value::from("2.5").coerce_to(ScalarType::Float).unwrap(), Value::Float(2.5));
        assert_eq!(Value::Int(3).coerce_to(ScalarType::Float).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn test_coerce_instance_to_scalar_fails() {
        let err = Value::Instance(Instance::new(5u32))
            .coerce_to(ScalarType::String)
            .unwrap_err();
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn test_entity_instance_exposes_entity_view() {
        let instance = Instance::entity(Post { id: Some(3) });
        assert!(instance.is_entity());
        assert_eq!(instance.as_entity().unwrap().entity_name(), "post");
        assert_eq!(instance.as_entity().unwrap().primary_key(), Some(Value::Int(3)));
        assert_eq!(instance.downcast::<Post>().unwrap().id, Some(3));
        assert!(instance.type_name().ends_with("Post"));
    }

    #[test]
    fn test_interface_instance_round_trip() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = Instance::interface(greeter);
        assert!(instance.type_name().contains("Greeter"));
        let back = instance.as_interface::<dyn Greeter>().unwrap();
        assert_eq!(back.greet(), "hello");
        assert!(!instance.is_entity());
    }

    #[test]
    fn test_instance_equality_is_identity() {
        let a = Instance::new(String::from("x"));
        let b = a.clone();
        let c = Instance::new(String::from("x"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
