//! Action invocation.
//!
//! Assembles the final [`Arguments`] in declaration order and calls the
//! target. Builtin-typed values are coerced to their declared scalar type on
//! the way in; the absence-value is passed as is. Errors raised by the action
//! come back as [`DispatchError::Action`] without modification.

use heron_core::action::Arguments;
use heron_core::{DispatchError, Response};

use crate::arguments::BoundArguments;
use crate::descriptor::{ActionDescriptor, ActionTarget};

/// Builds the argument list handed to the action.
///
/// # Errors
///
/// [`DispatchError::Binding`] if a bound value cannot be coerced to the
/// parameter's declared scalar type.
pub fn assemble(
    descriptor: &ActionDescriptor,
    mut bound: BoundArguments,
) -> Result<Arguments, DispatchError> {
    let mut args = Arguments::new();
    for param in descriptor.parameters() {
        let Some(value) = bound.take(&param.name) else {
            continue;
        };
        let value = match param.declared_type.as_ref().and_then(|t| t.scalar()) {
            Some(scalar) => value
                .coerce_to(scalar)
                .map_err(|e| e.for_parameter(&param.name))?,
            None => value,
        };
        args.insert(param.name.clone(), value);
    }
    Ok(args)
}

/// Invokes the described action with the bound arguments.
///
/// # Errors
///
/// Coercion failures from [`assemble`], or the action's own error.
pub async fn invoke(
    descriptor: &ActionDescriptor,
    bound: BoundArguments,
) -> Result<Response, DispatchError> {
    let args = assemble(descriptor, bound)?;
    let future = match descriptor.target() {
        ActionTarget::Method { handler, method } => handler.call(method, args),
        ActionTarget::Callable(closure) => closure.call(args),
    };
    Ok(future.await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use heron_core::action::{text_response, Action, Closure, Signature};
    use heron_core::fixtures::PostController;
    use heron_core::{ActionError, BindingError, ErrorCategory, ScalarType, ServiceContainer, TypeRef, Value};
    use heron_router::Route;

    use crate::classifier::Strategy;
    use crate::descriptor::describe;

    fn descriptor_for(closure: Closure) -> ActionDescriptor {
        let route = Route::new("/", Action::callable(closure));
        describe(&route, &ServiceContainer::new()).unwrap()
    }

    fn echo_ids() -> Closure {
        Closure::new(
            Signature::new()
                .param("id", TypeRef::builtin(ScalarType::Int))
                .untyped("rest"),
            |args| async move {
                let names: Vec<_> = args.names().map(str::to_string).collect();
                Ok::<_, ActionError>(text_response(format!(
                    "{:?} {}",
                    names,
                    args.int("id")?
                )))
            },
        )
    }

    #[test]
    fn test_assemble_orders_and_coerces() {
        let descriptor = descriptor_for(echo_ids());
        let mut bound = BoundArguments::new();
        bound.bind("rest", Value::from("x"), Strategy::Unresolved);
        bound.bind("id", Value::from("99"), Strategy::Unresolved);

        let args = assemble(&descriptor, bound).unwrap();
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["id", "rest"]);
        assert_eq!(args.get("id"), Some(&Value::Int(99)));
        assert_eq!(args.get("rest"), Some(&Value::from("x")));
    }

    #[test]
    fn test_assemble_keeps_null() {
        let descriptor = descriptor_for(echo_ids());
        let mut bound = BoundArguments::new();
        bound.bind("id", Value::Null, Strategy::OptionalRouteFallback);

        let args = assemble(&descriptor, bound).unwrap();
        assert!(args.is_null("id"));
        assert!(args.get("rest").is_none());
    }

    #[test]
    fn test_assemble_reports_coercion_failure() {
        let descriptor = descriptor_for(echo_ids());
        let mut bound = BoundArguments::new();
        bound.bind("id", Value::from("abc"), Strategy::Unresolved);

        let err = assemble(&descriptor, bound).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Binding(BindingError::ArgumentCoercion { ref parameter, .. })
                if parameter == "id"
        ));
    }

    #[tokio::test]
    async fn test_invoke_closure() {
        let descriptor = descriptor_for(echo_ids());
        let mut bound = BoundArguments::new();
        bound.bind("id", Value::from("7"), Strategy::Unresolved);

        let response = invoke(&descriptor, bound).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_invoke_method_with_no_arguments() {
        let route = Route::new("/", Action::method(Arc::new(PostController), "index"));
        let descriptor = describe(&route, &ServiceContainer::new()).unwrap();

        let response = invoke(&descriptor, BoundArguments::new()).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_action_error_is_unchanged() {
        let failing = Closure::new(Signature::new(), |_| async {
            Err::<heron_core::Response, _>(ActionError::new(ErrorCategory::Conflict, "already exists"))
        });
        let descriptor = descriptor_for(failing);

        let err = invoke(&descriptor, BoundArguments::new()).await.unwrap_err();
        match err {
            DispatchError::Action(e) => {
                assert_eq!(e.category(), ErrorCategory::Conflict);
                assert_eq!(e.message(), "already exists");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
