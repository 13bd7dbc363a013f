//! Parameter and action descriptors.
//!
//! [`describe`] turns a matched route into an [`ActionDescriptor`]: the
//! concrete target to call plus one [`ParameterDescriptor`] per formal
//! parameter, in declaration order. Describing the same route twice yields
//! equal descriptors.

use std::fmt;
use std::sync::Arc;

use heron_core::action::{Action, Closure, Controller, DeclaredType, HandlerRef, Signature};
use heron_core::{Container, DispatchError, IntrospectionError, TypeKind, TypeRef, Value};
use heron_router::Route;

/// Introspected metadata for one formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name.
    pub name: String,
    /// Declared type; a union is reduced to its first member.
    pub declared_type: Option<TypeRef>,
    /// `true` if the declared type is a builtin scalar.
    pub is_builtin: bool,
    /// Declared default value.
    pub default: Option<Value>,
    /// `true` if the route declares this name as an optional segment.
    pub optional_in_route: bool,
}

impl ParameterDescriptor {
    /// Returns `true` if a default value is declared.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Returns the kind of the declared type, if any.
    #[must_use]
    pub fn type_kind(&self) -> Option<TypeKind> {
        self.declared_type.as_ref().map(TypeRef::kind)
    }
}

/// Whether an action is a method call or a free callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// A method on a handler instance.
    MethodCall,
    /// A standalone closure.
    FreeCallable,
}

/// The resolved target of an action.
#[derive(Clone)]
pub enum ActionTarget {
    /// A method on a ready handler instance.
    Method {
        /// The handler.
        handler: Arc<dyn Controller>,
        /// The method name.
        method: String,
    },
    /// A standalone closure.
    Callable(Closure),
}

impl ActionTarget {
    /// Returns the kind of this target.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Method { .. } => ActionKind::MethodCall,
            Self::Callable(_) => ActionKind::FreeCallable,
        }
    }

    /// Returns a short label for logs (`Handler@method` or `closure`).
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Method { handler, method } => format!("{}@{}", handler.type_name(), method),
            Self::Callable(_) => "closure".to_string(),
        }
    }
}

impl PartialEq for ActionTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Method { handler: a, method: m },
                Self::Method { handler: b, method: n },
            ) => same_handler(a, b) && m == n,
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

fn same_handler(a: &Arc<dyn Controller>, b: &Arc<dyn Controller>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

impl fmt::Debug for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method { handler, method } => f
                .debug_struct("Method")
                .field("handler", &handler.type_name())
                .field("method", method)
                .finish(),
            Self::Callable(closure) => f.debug_tuple("Callable").field(closure).finish(),
        }
    }
}

/// Normalized view of an action with its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    target: ActionTarget,
    parameters: Vec<ParameterDescriptor>,
}

impl ActionDescriptor {
    /// Returns whether this is a method call or a free callable.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.target.kind()
    }

    /// Returns the call target.
    #[must_use]
    pub const fn target(&self) -> &ActionTarget {
        &self.target
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Returns a short label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        self.target.label()
    }
}

/// Describes the action of a matched route.
///
/// Named handlers are built through [`Container::controller`] first.
///
/// # Errors
///
/// - [`DispatchError::Resolution`] if a named handler is not registered
/// - [`DispatchError::Introspection`] if the method does not exist or the
///   signature is malformed
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use heron_bind::{describe, ActionKind};
/// use heron_core::{fixtures, Action};
/// use heron_router::Route;
///
/// let container = fixtures::blog_container();
/// let route = Route::new("/posts/{post}/comments/{id}", Action::named("PostController", "show"));
///
/// let descriptor = describe(&route, &container).unwrap();
/// assert_eq!(descriptor.kind(), ActionKind::MethodCall);
/// assert_eq!(descriptor.parameters().len(), 2);
/// assert_eq!(descriptor, describe(&route, &container).unwrap());
/// ```
pub fn describe(route: &Route, container: &dyn Container) -> Result<ActionDescriptor, DispatchError> {
    let (target, signature) = match route.action() {
        Action::Method { handler, method } => {
            let handler = match handler {
                HandlerRef::Instance(controller) => controller.clone(),
                HandlerRef::Named(name) => container.controller(name)?,
            };
            let signature = handler.signature(method).ok_or_else(|| {
                IntrospectionError::UnknownMethod {
                    handler: handler.type_name().to_string(),
                    method: method.clone(),
                }
            })?;
            let target = ActionTarget::Method {
                handler,
                method: method.clone(),
            };
            (target, signature)
        }
        Action::Callable(closure) => (
            ActionTarget::Callable(closure.clone()),
            closure.signature().clone(),
        ),
    };

    let parameters = describe_signature(&signature, route)?;
    Ok(ActionDescriptor { target, parameters })
}

/// Builds parameter descriptors from a signature.
///
/// # Errors
///
/// [`IntrospectionError::DuplicateParameter`] or
/// [`IntrospectionError::EmptyUnion`] for malformed signatures.
pub fn describe_signature(
    signature: &Signature,
    route: &Route,
) -> Result<Vec<ParameterDescriptor>, IntrospectionError> {
    let mut parameters: Vec<ParameterDescriptor> = Vec::with_capacity(signature.len());

    for spec in signature.params() {
        if parameters.iter().any(|p| p.name == spec.name) {
            return Err(IntrospectionError::DuplicateParameter {
                parameter: spec.name.clone(),
            });
        }

        let declared_type = match &spec.declared {
            None => None,
            Some(DeclaredType::Named(ty)) => Some(ty.clone()),
            // Only the first member of a union is considered.
            Some(DeclaredType::Union(members)) => Some(members.first().cloned().ok_or_else(
                || IntrospectionError::EmptyUnion {
                    parameter: spec.name.clone(),
                },
            )?),
        };

        parameters.push(ParameterDescriptor {
            is_builtin: declared_type.as_ref().is_some_and(TypeRef::is_builtin),
            declared_type,
            default: spec.default.clone(),
            optional_in_route: route.is_optional_param(&spec.name),
            name: spec.name.clone(),
        });
    }

    Ok(parameters)
}
