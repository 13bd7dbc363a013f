//! Actions and their declared signatures.
//!
//! An action is what a route points at: either a method on a controller or a
//! free-standing closure. Rust has no runtime reflection, so every action
//! publishes a [`Signature`] describing its formal parameters in declaration
//! order. The binding engine reads the signature, computes an argument list,
//! and calls the action with [`Arguments`].
//!
//! # Example
//!
//! ```
//! use heron_core::action::{Action, Closure, Signature, TypeRef};
//! use heron_core::value::ScalarType;
//!
//! let show = Closure::new(
//!     Signature::new()
//!         .param("id", TypeRef::builtin(ScalarType::Int))
//!         .untyped("format"),
//!     |args| async move {
//!         let id = args.int("id")?;
//!         Ok::<_, heron_core::ActionError>(heron_core::action::text_response(format!("post {id}")))
//!     },
//! );
//!
//! let action = Action::callable(show);
//! assert!(action.is_callable());
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use indexmap::IndexMap;

use crate::error::{ActionError, BindingError};
use crate::value::{Entity, Instance, ScalarType, Value};

/// The response artifact an action produces.
pub type Response = http::Response<Full<Bytes>>;

/// Outcome of invoking an action.
pub type ActionResult = Result<Response, ActionError>;

/// A boxed future returned by actions.
pub type ActionFuture = Pin<Box<dyn Future<Output = ActionResult> + Send + 'static>>;

/// Builds a `200 OK` plain-text response.
#[must_use]
pub fn text_response(body: impl Into<String>) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body.into())));
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// What a declared type name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A builtin scalar.
    Builtin(ScalarType),
    /// A concrete, constructible type.
    Class,
    /// An abstract capability (trait object).
    Interface,
    /// A type name the application does not define.
    Unknown,
}

/// A single named type in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    name: String,
    kind: TypeKind,
}

impl TypeRef {
    /// A builtin scalar type.
    #[must_use]
    pub fn builtin(scalar: ScalarType) -> Self {
        Self {
            name: scalar.name().to_string(),
            kind: TypeKind::Builtin(scalar),
        }
    }

    /// A concrete type, named after `T`.
    #[must_use]
    pub fn class<T: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<T>(), TypeKind::Class)
    }

    /// An interface, named after the trait object type `I` (e.g. `dyn Logger`).
    #[must_use]
    pub fn interface<I: ?Sized + 'static>() -> Self {
        Self::named(std::any::type_name::<I>(), TypeKind::Interface)
    }

    /// A type with an explicit name and kind.
    #[must_use]
    pub fn named(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns what the name refers to.
    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns the scalar type for builtins.
    #[must_use]
    pub const fn scalar(&self) -> Option<ScalarType> {
        match self.kind {
            TypeKind::Builtin(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for builtin scalars.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        matches!(self.kind, TypeKind::Builtin(_))
    }
}

/// The type annotation of a parameter as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// A single type.
    Named(TypeRef),
    /// A union `A|B|...`.
    Union(Vec<TypeRef>),
}

impl From<TypeRef> for DeclaredType {
    fn from(ty: TypeRef) -> Self {
        Self::Named(ty)
    }
}

/// One formal parameter as declared by an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Declared type, if any.
    pub declared: Option<DeclaredType>,
    /// Declared default value, if any.
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// Creates a parameter with no type and no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared: None,
            default: None,
        }
    }

    /// Sets the declared type.
    #[must_use]
    pub fn typed(mut self, ty: impl Into<DeclaredType>) -> Self {
        self.declared = Some(ty.into());
        self
    }

    /// Sets the declared default.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Ordered list of an action's formal parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<ParameterSpec>,
}

impl Signature {
    /// Creates an empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a typed parameter.
    #[must_use]
    pub fn param(self, name: impl Into<String>, ty: impl Into<DeclaredType>) -> Self {
        self.push(ParameterSpec::new(name).typed(ty))
    }

    /// Appends a typed parameter with a default.
    #[must_use]
    pub fn param_or(
        self,
        name: impl Into<String>,
        ty: impl Into<DeclaredType>,
        default: impl Into<Value>,
    ) -> Self {
        self.push(ParameterSpec::new(name).typed(ty).with_default(default))
    }

    /// Appends a parameter typed as the union of `members`.
    #[must_use]
    pub fn union(self, name: impl Into<String>, members: Vec<TypeRef>) -> Self {
        self.push(ParameterSpec::new(name).typed(DeclaredType::Union(members)))
    }

    /// Appends an untyped parameter.
    #[must_use]
    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.push(ParameterSpec::new(name))
    }

    /// Appends a fully specified parameter.
    #[must_use]
    pub fn push(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the action takes no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// The named, ordered argument list passed to an action.
///
/// Accessors return [`BindingError`] for missing or mistyped arguments,
/// which converts into an [`ActionError`] with `?`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns the raw value, or `None` when the argument was not bound.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if the argument was bound to the absence-value.
    #[must_use]
    pub fn is_null(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(Value::Null))
    }

    /// Returns the number of bound arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no argument was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the argument names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterates over `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&Value, BindingError> {
        self.values
            .get(name)
            .ok_or_else(|| BindingError::missing(name))
    }

    fn mismatch(name: &str, expected: &str, actual: &Value) -> BindingError {
        BindingError::TypeMismatch {
            parameter: name.to_string(),
            expected: expected.to_string(),
            actual: actual.kind().to_string(),
        }
    }

    /// Reads a text argument.
    pub fn text(&self, name: &str) -> Result<&str, BindingError> {
        match self.require(name)? {
            Value::Text(s) => Ok(s),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    /// Reads an integer argument.
    pub fn int(&self, name: &str) -> Result<i64, BindingError> {
        match self.require(name)? {
            Value::Int(i) => Ok(*i),
            other => Err(Self::mismatch(name, "int", other)),
        }
    }

    /// Reads a float argument.
    pub fn float(&self, name: &str) -> Result<f64, BindingError> {
        match self.require(name)? {
            Value::Float(f) => Ok(*f),
            other => Err(Self::mismatch(name, "float", other)),
        }
    }

    /// Reads a boolean argument.
    pub fn bool(&self, name: &str) -> Result<bool, BindingError> {
        match self.require(name)? {
            Value::Bool(b) => Ok(*b),
            other => Err(Self::mismatch(name, "bool", other)),
        }
    }

    /// Reads an object argument as a concrete type.
    pub fn instance<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, BindingError> {
        let value = self.require(name)?;
        value
            .as_instance()
            .and_then(Instance::downcast::<T>)
            .ok_or_else(|| Self::mismatch(name, std::any::type_name::<T>(), value))
    }

    /// Reads an object argument as a trait object.
    pub fn interface<I: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<I>, BindingError> {
        let value = self.require(name)?;
        value
            .as_instance()
            .and_then(Instance::as_interface::<I>)
            .ok_or_else(|| Self::mismatch(name, std::any::type_name::<I>(), value))
    }

    /// Reads a hydrated entity argument.
    pub fn entity<T: Entity>(&self, name: &str) -> Result<Arc<T>, BindingError> {
        let value = self.require(name)?;
        value
            .as_instance()
            .filter(|i| i.is_entity())
            .and_then(Instance::downcast::<T>)
            .ok_or_else(|| Self::mismatch(name, std::any::type_name::<T>(), value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A handler object exposing one or more action methods.
///
/// # Example
///
/// ```
/// use heron_core::action::{text_response, ActionFuture, Arguments, Controller, Signature, TypeRef};
/// use heron_core::value::ScalarType;
///
/// struct PageController;
///
/// impl Controller for PageController {
///     fn type_name(&self) -> &str {
///         "PageController"
///     }
///
///     fn signature(&self, method: &str) -> Option<Signature> {
///         match method {
///             "show" => Some(Signature::new().param("slug", TypeRef::builtin(ScalarType::String))),
///             _ => None,
///         }
///     }
///
///     fn call(&self, _method: &str, args: Arguments) -> ActionFuture {
///         Box::pin(async move {
///             let slug = args.text("slug")?;
///             Ok::<_, heron_core::ActionError>(text_response(slug.to_string()))
///         })
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Name used in logs and errors.
    fn type_name(&self) -> &str;

    /// Returns the signature of `method`, or `None` if there is no such method.
    fn signature(&self, method: &str) -> Option<Signature>;

    /// Invokes `method` with the bound arguments.
    ///
    /// Only called for methods that [`Controller::signature`] describes.
    fn call(&self, method: &str, args: Arguments) -> ActionFuture;
}

type ClosureFn = dyn Fn(Arguments) -> ActionFuture + Send + Sync + 'static;

/// A free-standing callable action with its signature.
#[derive(Clone)]
pub struct Closure {
    signature: Signature,
    func: Arc<ClosureFn>,
}

impl Closure {
    /// Wraps an async function together with its declared signature.
    pub fn new<F, Fut>(signature: Signature, func: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self {
            signature,
            func: Arc::new(move |args| -> ActionFuture { Box::pin(func(args)) }),
        }
    }

    /// Returns the declared signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Calls the closure.
    pub fn call(&self, args: Arguments) -> ActionFuture {
        (self.func)(args)
    }

    /// Returns `true` if both closures wrap the same function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// The handler half of a method action.
#[derive(Clone)]
pub enum HandlerRef {
    /// A ready handler instance.
    Instance(Arc<dyn Controller>),
    /// A handler registered in the container under this name.
    Named(String),
}

impl HandlerRef {
    /// Returns a display name for the handler.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Instance(c) => c.type_name(),
            Self::Named(n) => n,
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(c) => f.debug_tuple("Instance").field(&c.type_name()).finish(),
            Self::Named(n) => f.debug_tuple("Named").field(n).finish(),
        }
    }
}

/// What a route resolves to.
#[derive(Debug, Clone)]
pub enum Action {
    /// A method on a handler.
    Method {
        /// The handler.
        handler: HandlerRef,
        /// The method name.
        method: String,
    },
    /// A free-standing closure.
    Callable(Closure),
}

impl Action {
    /// A method on a ready handler instance.
    pub fn method(handler: Arc<dyn Controller>, method: impl Into<String>) -> Self {
        Self::Method {
            handler: HandlerRef::Instance(handler),
            method: method.into(),
        }
    }

    /// A method on a handler the container builds by name.
    pub fn named(handler: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            handler: HandlerRef::Named(handler.into()),
            method: method.into(),
        }
    }

    /// A closure action.
    #[must_use]
    pub fn callable(closure: Closure) -> Self {
        Self::Callable(closure)
    }

    /// Returns `true` for closure actions.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }

    /// Returns a short label for logs (`Handler@method` or `closure`).
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Method { handler, method } => format!("{}@{}", handler.name(), method),
            Self::Callable(_) => "closure".to_string(),
        }
    }
}
