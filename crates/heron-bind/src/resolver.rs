//! Value resolution.
//!
//! Produces the value for one parameter once its [`Strategy`] is known.
//! Container and hydration failures propagate as distinct
//! [`DispatchError`] variants; an [`Strategy::Unresolved`] parameter yields
//! `Ok(None)` and the caller applies its policy.

use heron_core::{Container, ContextArgs, DispatchError, Value};
use heron_router::RouteAttributes;

use crate::classifier::Strategy;
use crate::descriptor::ParameterDescriptor;

/// Resolves the value of `param` using `strategy`.
///
/// # Errors
///
/// - [`DispatchError::Resolution`] when the container cannot build the type
/// - [`DispatchError::Hydration`] when an entity identifier matches no record
/// - [`DispatchError::Binding`] when an untyped attribute has no text form
pub fn resolve(
    param: &ParameterDescriptor,
    strategy: Strategy,
    attributes: &RouteAttributes,
    container: &dyn Container,
) -> Result<Option<Value>, DispatchError> {
    let raw = attributes.get(&param.name).filter(|v| !v.is_null());
    let type_name = param.declared_type.as_ref().map_or("", |t| t.name());

    let value = match strategy {
        Strategy::EntityOrClass => {
            let instance = container.get(type_name, &ContextArgs::new())?;
            if instance.is_entity() {
                Value::Instance(container.get_instance_entity(&instance, raw)?)
            } else {
                // The instance already built stands in when no attribute is
                // present; the container is not asked a second time.
                raw.cloned().unwrap_or(Value::Instance(instance))
            }
        }
        Strategy::Interface | Strategy::DirectContainer => {
            let context = context_args(&param.name, raw);
            Value::Instance(container.get(type_name, &context)?)
        }
        Strategy::AttributePassthrough { coerce_to_text } => {
            let raw = raw.cloned().unwrap_or_default();
            if coerce_to_text {
                Value::Text(raw.to_text().map_err(|e| e.for_parameter(&param.name))?)
            } else {
                raw
            }
        }
        Strategy::OptionalRouteFallback => param.default.clone().unwrap_or(Value::Null),
        Strategy::DefaultFallback => match &param.default {
            Some(default) => default.clone(),
            None => return Ok(None),
        },
        Strategy::Unresolved => return Ok(None),
    };

    Ok(Some(value))
}

/// Context arguments forwarded to the container: the raw attribute keyed by
/// the parameter name, or nothing.
fn context_args(name: &str, raw: Option<&Value>) -> ContextArgs {
    raw.map_or_else(ContextArgs::new, |value| {
        ContextArgs::single(name, value.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use heron_core::di::Lifetime;
    use heron_core::fixtures::{self, Logger, Post, MISSING_POST_ID};
    use heron_core::{
        HydrationError, Instance, ResolutionError, ScalarType, ServiceContainer, TypeKind, TypeRef,
    };

    /// Records every context a factory saw.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<ContextArgs>>);

    impl Recorder {
        fn push(&self, ctx: &ContextArgs) {
            self.0.lock().unwrap().push(ctx.clone());
        }

        fn seen(&self) -> Vec<ContextArgs> {
            self.0.lock().unwrap().clone()
        }
    }

    fn param(name: &str, ty: Option<TypeRef>) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.to_string(),
            is_builtin: ty.as_ref().is_some_and(TypeRef::is_builtin),
            declared_type: ty,
            default: None,
            optional_in_route: false,
        }
    }

    #[test]
    fn test_entity_is_hydrated_with_identifier() {
        let container = fixtures::blog_container();
        let attrs = RouteAttributes::new().with("post", "42");
        let p = param("post", Some(TypeRef::class::<Post>()));

        let value = resolve(&p, Strategy::EntityOrClass, &attrs, &container)
            .unwrap()
            .unwrap();
        let post = value.as_instance().unwrap().downcast::<Post>().unwrap();
        assert_eq!(post.id, Some(42));
    }

    #[test]
    fn test_entity_not_found_propagates() {
        let container = fixtures::blog_container();
        let attrs = RouteAttributes::new().with("post", MISSING_POST_ID);
        let p = param("post", Some(TypeRef::class::<Post>()));

        let err = resolve(&p, Strategy::EntityOrClass, &attrs, &container).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Hydration(HydrationError::NotFound { .. })
        ));
    }

    #[test]
    fn test_entity_without_attribute_is_still_hydrated() {
        let container = fixtures::blog_container();
        let p = param("post", Some(TypeRef::class::<Post>()));

        let err = resolve(&p, Strategy::EntityOrClass, &RouteAttributes::new(), &container)
            .unwrap_err();
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[test]
    fn test_plain_class_passes_attribute_through() {
        let mut container = ServiceContainer::new();
        container.singleton_as("Clock", Instance::new(5u64));
        let p = param("clock", Some(TypeRef::named("Clock", TypeKind::Class)));

        let with_attr = RouteAttributes::new().with("clock", "noon");
        let value = resolve(&p, Strategy::EntityOrClass, &with_attr, &container)
            .unwrap()
            .unwrap();
        assert_eq!(value, Value::from("noon"));

        let value = resolve(&p, Strategy::EntityOrClass, &RouteAttributes::new(), &container)
            .unwrap()
            .unwrap();
        assert_eq!(
            *value.as_instance().unwrap().downcast::<u64>().unwrap(),
            5
        );
    }

    #[test]
    fn test_interface_resolves_with_empty_context() {
        let container = fixtures::blog_container();
        let p = param("log", Some(TypeRef::interface::<dyn Logger>()));

        let value = resolve(&p, Strategy::Interface, &RouteAttributes::new(), &container)
            .unwrap()
            .unwrap();
        assert!(value
            .as_instance()
            .unwrap()
            .as_interface::<dyn Logger>()
            .is_some());
    }

    #[test]
    fn test_container_receives_attribute_as_context() {
        let recorder = Arc::new(Recorder::default());
        let seen = recorder.clone();

        let mut container = ServiceContainer::new();
        container.factory("Mailer", Lifetime::Transient, move |_, ctx| {
            seen.push(ctx);
            Ok(Instance::new(()))
        });
        let p = param("mailer", Some(TypeRef::named("Mailer", TypeKind::Unknown)));

        let attrs = RouteAttributes::new().with("mailer", "smtp");
        resolve(&p, Strategy::DirectContainer, &attrs, &container).unwrap();
        resolve(&p, Strategy::DirectContainer, &RouteAttributes::new(), &container).unwrap();

        let contexts = recorder.seen();
        assert_eq!(contexts[0], ContextArgs::single("mailer", Value::from("smtp")));
        assert!(contexts[1].is_empty());
    }

    #[test]
    fn test_resolution_error_is_distinct() {
        let container = ServiceContainer::new();
        let p = param("log", Some(TypeRef::named("dyn Missing", TypeKind::Interface)));

        let err = resolve(&p, Strategy::Interface, &RouteAttributes::new(), &container)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Resolution(ResolutionError::NotRegistered { .. })
        ));
    }

    #[test]
    fn test_passthrough_is_verbatim() {
        let attrs = RouteAttributes::new().with("id", "99");
        let p = param("id", Some(TypeRef::builtin(ScalarType::Int)));
        let value = resolve(
            &p,
            Strategy::AttributePassthrough {
                coerce_to_text: false,
            },
            &attrs,
            &ServiceContainer::new(),
        )
        .unwrap();
        assert_eq!(value, Some(Value::from("99")));
    }

    #[test]
    fn test_untyped_passthrough_becomes_text() {
        let attrs = RouteAttributes::new().with("n", 12);
        let value = resolve(
            &param("n", None),
            Strategy::AttributePassthrough {
                coerce_to_text: true,
            },
            &attrs,
            &ServiceContainer::new(),
        )
        .unwrap();
        assert_eq!(value, Some(Value::from("12")));
    }

    #[test]
    fn test_optional_fallback_binds_null_without_default() {
        let p = param("page", Some(TypeRef::builtin(ScalarType::Int)));
        let value = resolve(
            &p,
            Strategy::OptionalRouteFallback,
            &RouteAttributes::new(),
            &ServiceContainer::new(),
        )
        .unwrap();
        assert_eq!(value, Some(Value::Null));
    }

    #[test]
    fn test_default_fallback() {
        let mut p = param("page", Some(TypeRef::builtin(ScalarType::Int)));
        p.default = Some(Value::Int(3));
        let container = ServiceContainer::new();

        let value = resolve(&p, Strategy::DefaultFallback, &RouteAttributes::new(), &container);
        assert_eq!(value.unwrap(), Some(Value::Int(3)));

        let value = resolve(&p, Strategy::OptionalRouteFallback, &RouteAttributes::new(), &container);
        assert_eq!(value.unwrap(), Some(Value::Int(3)));
    }

    #[test]
    fn test_unresolved_yields_nothing() {
        let value = resolve(
            &param("x", None),
            Strategy::Unresolved,
            &RouteAttributes::new(),
            &ServiceContainer::new(),
        )
        .unwrap();
        assert_eq!(value, None);
    }
}
