//! Error types for Heron.
//!
//! Binding failures are kept apart by origin so the pipeline can tell a
//! container failure from a missing record or a misconfigured route:
//!
//! | Error | Raised when | Status |
//! |---|---|---|
//! | [`ResolutionError`] | the container cannot produce an instance | 500 |
//! | [`HydrationError`] | an entity identifier matches no record | 404 |
//! | [`IntrospectionError`] | the action shape cannot be described | 500 |
//! | [`BindingError`] | a parameter has no value or the wrong type | 400 |
//! | [`ActionError`] | the action itself failed | by category |
//!
//! [`DispatchError`] wraps all of them and renders the JSON envelope that the
//! middleware boundary writes back to the client.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::ScalarType;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid input (bad or missing argument).
    Validation,
    /// Resource not found.
    NotFound,
    /// Permission denied.
    Authorization,
    /// Conflict (e.g., concurrent modification).
    Conflict,
    /// Internal server errors, including route misconfiguration.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The container could not produce an instance for a type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Nothing is registered under the type name.
    #[error("cannot resolve {type_name}: not registered")]
    NotRegistered {
        /// The requested type name.
        type_name: String,
    },

    /// The type is registered but refused to build.
    #[error("cannot resolve {type_name}: {reason}")]
    NotInstantiable {
        /// The requested type name.
        type_name: String,
        /// Why construction failed.
        reason: String,
    },

    /// Alias chain loops back on itself.
    #[error("cannot resolve {type_name}: binding cycle detected")]
    Cycle {
        /// The requested type name.
        type_name: String,
    },
}

impl ResolutionError {
    /// Creates a not-registered error.
    pub fn not_registered(type_name: impl Into<String>) -> Self {
        Self::NotRegistered {
            type_name: type_name.into(),
        }
    }

    /// Creates a not-instantiable error.
    pub fn not_instantiable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotInstantiable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the type name that failed to resolve.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::NotRegistered { type_name }
            | Self::NotInstantiable { type_name, .. }
            | Self::Cycle { type_name } => type_name,
        }
    }
}

/// An entity could not be hydrated from its identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HydrationError {
    /// No persisted record matches the identifier.
    #[error("{entity} with identifier '{identifier}' not found")]
    NotFound {
        /// Logical entity name.
        entity: String,
        /// The identifier as received (empty when absent).
        identifier: String,
    },

    /// The prototype handed to hydration is not an entity.
    #[error("{type_name} is not an entity")]
    NotAnEntity {
        /// Type name of the prototype.
        type_name: String,
    },

    /// No repository is registered for the entity type.
    #[error("no repository registered for {type_name}")]
    NoRepository {
        /// Type name of the prototype.
        type_name: String,
    },

    /// The repository failed for another reason.
    #[error("failed to hydrate {entity}: {reason}")]
    Failed {
        /// Logical entity name.
        entity: String,
        /// Failure description.
        reason: String,
    },
}

impl HydrationError {
    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }
}

/// The action's shape could not be introspected.
///
/// This is a route configuration mistake and is never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntrospectionError {
    /// The handler has no method by that name.
    #[error("method {handler}::{method} does not exist")]
    UnknownMethod {
        /// Handler type name.
        handler: String,
        /// Requested method.
        method: String,
    },

    /// A signature declares the same parameter twice.
    #[error("parameter '{parameter}' is declared more than once")]
    DuplicateParameter {
        /// The repeated parameter name.
        parameter: String,
    },

    /// A union type with no members.
    #[error("parameter '{parameter}' declares an empty union type")]
    EmptyUnion {
        /// The parameter name.
        parameter: String,
    },
}

/// A parameter could not be bound or read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// No strategy produced a value and the policy rejects omission.
    #[error("parameter '{parameter}' could not be resolved")]
    Unresolved {
        /// The parameter name.
        parameter: String,
    },

    /// The action asked for an argument that was not bound.
    #[error("missing argument '{parameter}'")]
    MissingArgument {
        /// The parameter name.
        parameter: String,
    },

    /// A value could not be coerced to the declared scalar type.
    #[error("cannot coerce {from} to {to}")]
    Coercion {
        /// Source value kind.
        from: String,
        /// Target scalar type.
        to: ScalarType,
    },

    /// A value could not be coerced for a named parameter.
    #[error("argument '{parameter}': cannot coerce {from} to {to}")]
    ArgumentCoercion {
        /// The parameter name.
        parameter: String,
        /// Source value kind.
        from: String,
        /// Target scalar type.
        to: ScalarType,
    },

    /// The action read an argument as the wrong type.
    #[error("argument '{parameter}' is {actual}, expected {expected}")]
    TypeMismatch {
        /// The parameter name.
        parameter: String,
        /// What the action expected.
        expected: String,
        /// What was bound.
        actual: String,
    },
}

impl BindingError {
    /// Creates a coercion error.
    pub fn coercion(from: impl Into<String>, to: ScalarType) -> Self {
        Self::Coercion {
            from: from.into(),
            to,
        }
    }

    /// Attaches the parameter name to a coercion error.
    #[must_use]
    pub fn for_parameter(self, parameter: &str) -> Self {
        match self {
            Self::Coercion { from, to } => Self::ArgumentCoercion {
                parameter: parameter.to_string(),
                from,
                to,
            },
            other => other,
        }
    }

    /// Creates a missing-argument error.
    pub fn missing(parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
        }
    }
}

/// An error raised by an action while handling the request.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ActionError {
    category: ErrorCategory,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl ActionError {
    /// Creates an action error in the given category.
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::NotFound, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, message)
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            category: ErrorCategory::Internal,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<BindingError> for ActionError {
    fn from(err: BindingError) -> Self {
        Self {
            category: ErrorCategory::Validation,
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}

/// Any failure surfaced by the dispatch engine.
///
/// Every variant is propagated unchanged to the pipeline, which decides
/// how to render it.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Container resolution failed.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Entity hydration failed.
    #[error("hydration error: {0}")]
    Hydration(#[from] HydrationError),

    /// The action could not be introspected.
    #[error("introspection error: {0}")]
    Introspection(#[from] IntrospectionError),

    /// A parameter could not be bound.
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),

    /// The action failed.
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl DispatchError {
    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Resolution(_) | Self::Introspection(_) => ErrorCategory::Internal,
            Self::Hydration(HydrationError::NotFound { .. }) => ErrorCategory::NotFound,
            Self::Hydration(_) => ErrorCategory::Internal,
            Self::Binding(_) => ErrorCategory::Validation,
            Self::Action(e) => e.category(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "RESOLUTION_ERROR",
            Self::Hydration(HydrationError::NotFound { .. }) => "ENTITY_NOT_FOUND",
            Self::Hydration(_) => "HYDRATION_ERROR",
            Self::Introspection(_) => "INTROSPECTION_ERROR",
            Self::Binding(_) => "BINDING_ERROR",
            Self::Action(e) => match e.category() {
                ErrorCategory::Validation => "VALIDATION_ERROR",
                ErrorCategory::NotFound => "NOT_FOUND",
                ErrorCategory::Authorization => "AUTHORIZATION_DENIED",
                ErrorCategory::Conflict => "CONFLICT",
                ErrorCategory::Internal => "INTERNAL_ERROR",
            },
        }
    }

    /// Converts this error to a serializable error envelope.
    ///
    /// Internal failures do not leak their message to clients.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let message = match self.category() {
            ErrorCategory::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                category: self.category(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}
