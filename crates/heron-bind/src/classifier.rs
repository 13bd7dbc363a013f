//! Type classification.
//!
//! Decides which binding [`Strategy`] applies to a parameter. Rules are
//! evaluated top to bottom and the first match wins:
//!
//! | # | Condition | Strategy |
//! |---|---|---|
//! | 1a | typed, concrete class | [`Strategy::EntityOrClass`] |
//! | 1b | typed, interface | [`Strategy::Interface`] |
//! | 1c | typed, unknown type name | [`Strategy::DirectContainer`] |
//! | 2 | builtin scalar, non-empty attribute | [`Strategy::AttributePassthrough`] |
//! | 3 | untyped, non-empty attribute | [`Strategy::AttributePassthrough`], as text |
//! | 4 | optional route segment | [`Strategy::OptionalRouteFallback`] |
//! | 5 | declared default | [`Strategy::DefaultFallback`] |
//! | 6 | anything else | [`Strategy::Unresolved`] |
//!
//! "Non-empty" uses [`Value::is_empty`](heron_core::Value::is_empty), so an
//! attribute of `"0"` does not count as present.

use std::fmt;

use heron_core::TypeKind;
use heron_router::RouteAttributes;

use crate::descriptor::ParameterDescriptor;

/// How a parameter gets its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Resolve the class through the container, hydrating entities.
    EntityOrClass,
    /// Resolve the interface through the container.
    Interface,
    /// Resolve the raw type name through the container.
    DirectContainer,
    /// Use the route attribute.
    AttributePassthrough {
        /// Render the attribute as text (untyped parameters).
        coerce_to_text: bool,
    },
    /// Use the default, or the absence-value.
    OptionalRouteFallback,
    /// Use the declared default.
    DefaultFallback,
    /// Nothing applies.
    Unresolved,
}

impl Strategy {
    /// Returns a short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EntityOrClass => "entity_or_class",
            Self::Interface => "interface",
            Self::DirectContainer => "direct_container",
            Self::AttributePassthrough {
                coerce_to_text: false,
            } => "attribute",
            Self::AttributePassthrough {
                coerce_to_text: true,
            } => "attribute_text",
            Self::OptionalRouteFallback => "optional_route",
            Self::DefaultFallback => "default",
            Self::Unresolved => "unresolved",
        }
    }

    /// Returns `true` if this strategy consults the container.
    #[must_use]
    pub const fn uses_container(self) -> bool {
        matches!(
            self,
            Self::EntityOrClass | Self::Interface | Self::DirectContainer
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classifies one parameter against the request's route attributes.
///
/// # Example
///
/// ```rust
/// use heron_bind::{classify, ParameterDescriptor, Strategy};
/// use heron_core::{ScalarType, TypeRef};
/// use heron_router::RouteAttributes;
///
/// let id = ParameterDescriptor {
///     name: "id".to_string(),
///     declared_type: Some(TypeRef::builtin(ScalarType::Int)),
///     is_builtin: true,
///     default: None,
///     optional_in_route: false,
/// };
///
/// let attributes = RouteAttributes::new().with("id", "99");
/// assert_eq!(
///     classify(&id, &attributes),
///     Strategy::AttributePassthrough { coerce_to_text: false }
/// );
/// assert_eq!(classify(&id, &RouteAttributes::new()), Strategy::Unresolved);
/// ```
#[must_use]
pub fn classify(param: &ParameterDescriptor, attributes: &RouteAttributes) -> Strategy {
    let has_attribute = attributes
        .get(&param.name)
        .is_some_and(|value| !value.is_empty());

    match param.type_kind() {
        Some(TypeKind::Class) => return Strategy::EntityOrClass,
        Some(TypeKind::Interface) => return Strategy::Interface,
        Some(TypeKind::Unknown) => return Strategy::DirectContainer,
        Some(TypeKind::Builtin(_)) if has_attribute => {
            return Strategy::AttributePassthrough {
                coerce_to_text: false,
            }
        }
        None if has_attribute => {
            return Strategy::AttributePassthrough {
                coerce_to_text: true,
            }
        }
        _ => {}
    }

    if param.optional_in_route {
        Strategy::OptionalRouteFallback
    } else if param.has_default() {
        Strategy::DefaultFallback
    } else {
        Strategy::Unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{ScalarType, TypeRef, Value};

    fn param(name: &str, ty: Option<TypeRef>) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.to_string(),
            is_builtin: ty.as_ref().is_some_and(TypeRef::is_builtin),
            declared_type: ty,
            default: None,
            optional_in_route: false,
        }
    }

    fn int_param(name: &str) -> ParameterDescriptor {
        param(name, Some(TypeRef::builtin(ScalarType::Int)))
    }

    #[test]
    fn test_class_wins_regardless_of_attribute() {
        let p = param("post", Some(TypeRef::named("Post", TypeKind::Class)));
        assert_eq!(classify(&p, &RouteAttributes::new()), Strategy::EntityOrClass);
        let attrs = RouteAttributes::new().with("post", "7");
        assert_eq!(classify(&p, &attrs), Strategy::EntityOrClass);
    }

    #[test]
    fn test_interface_and_unknown_types() {
        let log = param("log", Some(TypeRef::named("dyn Logger", TypeKind::Interface)));
        assert_eq!(classify(&log, &RouteAttributes::new()), Strategy::Interface);

        let ghost = param("ghost", Some(TypeRef::named("Ghost", TypeKind::Unknown)));
        assert_eq!(classify(&ghost, &RouteAttributes::new()), Strategy::DirectContainer);
    }

    #[test]
    fn test_builtin_with_attribute() {
        let attrs = RouteAttributes::new().with("id", "99");
        assert_eq!(
            classify(&int_param("id"), &attrs),
            Strategy::AttributePassthrough {
                coerce_to_text: false
            }
        );
    }

    #[test]
    fn test_untyped_with_attribute_is_text() {
        let attrs = RouteAttributes::new().with("slug", 12);
        assert_eq!(
            classify(&param("slug", None), &attrs),
            Strategy::AttributePassthrough {
                coerce_to_text: true
            }
        );
    }

    #[test]
    fn test_empty_attribute_is_ignored() {
        let mut p = int_param("page");
        p.default = Some(Value::Int(1));

        for empty in ["", "0"] {
            let attrs = RouteAttributes::new().with("page", empty);
            assert_eq!(classify(&p, &attrs), Strategy::DefaultFallback);
        }
    }

    #[test]
    fn test_optional_segment_before_default() {
        let mut p = int_param("page");
        p.optional_in_route = true;
        p.default = Some(Value::Int(1));
        assert_eq!(
            classify(&p, &RouteAttributes::new()),
            Strategy::OptionalRouteFallback
        );
    }

    #[test]
    fn test_untyped_without_anything_is_unresolved() {
        assert_eq!(
            classify(&param("x", None), &RouteAttributes::new()),
            Strategy::Unresolved
        );
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::EntityOrClass.to_string(), "entity_or_class");
        assert!(Strategy::Interface.uses_container());
        assert!(!Strategy::DefaultFallback.uses_container());
    }
}
