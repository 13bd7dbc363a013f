//! Binding an action's parameters.
//!
//! [`Binder::bind`] walks the descriptor's parameters in declaration order,
//! classifies each one, resolves its value and accumulates the
//! [`BoundArguments`]. What happens to a parameter nothing can satisfy is
//! decided by the [`UnresolvedPolicy`].

use serde::{Deserialize, Serialize};

use heron_core::{BindingError, Container, DispatchError};
use heron_router::RouteAttributes;

use crate::arguments::BoundArguments;
use crate::classifier::{classify, Strategy};
use crate::descriptor::{ActionDescriptor, ParameterDescriptor};
use crate::resolver::resolve;

/// What to do with a parameter no strategy can satisfy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Fail with [`BindingError::Unresolved`] before the action runs.
    #[default]
    Reject,
    /// Leave the parameter out of the argument list.
    Omit,
}

/// Drives classification and resolution for one action.
///
/// # Example
///
/// ```rust
/// use heron_bind::{describe, Binder, UnresolvedPolicy};
/// use heron_core::{fixtures, Action, Value};
/// use heron_router::{Route, RouteAttributes};
///
/// let container = fixtures::blog_container();
/// let route = Route::new("/posts/{post}/comments/{id}", Action::named("PostController", "show"));
/// let attributes = RouteAttributes::new().with("post", "7").with("id", "99");
///
/// let descriptor = describe(&route, &container).unwrap();
/// let bound = Binder::new(UnresolvedPolicy::Reject)
///     .bind(&descriptor, &attributes, &container)
///     .unwrap();
///
/// assert_eq!(bound.names().collect::<Vec<_>>(), vec!["post", "id"]);
/// assert_eq!(bound.get("id"), Some(&Value::from("99")));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Binder {
    policy: UnresolvedPolicy,
    log_bindings: bool,
}

impl Binder {
    /// Creates a binder with the given policy.
    #[must_use]
    pub const fn new(policy: UnresolvedPolicy) -> Self {
        Self {
            policy,
            log_bindings: true,
        }
    }

    /// Enables or disables the per-parameter debug events.
    #[must_use]
    pub const fn with_log_bindings(mut self, enabled: bool) -> Self {
        self.log_bindings = enabled;
        self
    }

    /// Returns the unresolved-parameter policy.
    #[must_use]
    pub const fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    /// Binds every parameter of `descriptor`.
    ///
    /// Container failures abort binding immediately; later parameters are
    /// not resolved.
    ///
    /// # Errors
    ///
    /// Any [`DispatchError`] from resolution, or [`BindingError::Unresolved`]
    /// under [`UnresolvedPolicy::Reject`].
    pub fn bind(
        &self,
        descriptor: &ActionDescriptor,
        attributes: &RouteAttributes,
        container: &dyn Container,
    ) -> Result<BoundArguments, DispatchError> {
        let mut bound = BoundArguments::new();

        for (param, strategy) in Self::plan(descriptor, attributes) {
            if self.log_bindings {
                tracing::debug!(
                    parameter = %param.name,
                    strategy = %strategy,
                    container = strategy.uses_container(),
                    "binding parameter"
                );
            }

            match resolve(param, strategy, attributes, container)? {
                Some(value) => {
                    bound.bind(param.name.clone(), value, strategy);
                }
                None => {
                    tracing::warn!(
                        parameter = %param.name,
                        action = %descriptor.label(),
                        policy = ?self.policy,
                        "parameter could not be resolved"
                    );
                    if self.policy == UnresolvedPolicy::Reject {
                        return Err(BindingError::Unresolved {
                            parameter: param.name.clone(),
                        }
                        .into());
                    }
                }
            }
        }

        Ok(bound)
    }

    /// Classifies every parameter in declaration order, without resolving.
    #[must_use]
    pub fn plan<'d>(
        descriptor: &'d ActionDescriptor,
        attributes: &RouteAttributes,
    ) -> Vec<(&'d ParameterDescriptor, Strategy)> {
        descriptor
            .parameters()
            .iter()
            .map(|p| (p, classify(p, attributes)))
            .collect()
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(UnresolvedPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use heron_core::action::{Action, Closure, Signature};
    use heron_core::fixtures::{self, PostController};
    use heron_core::{ActionError, ServiceContainer, Value};
    use heron_router::Route;

    use crate::descriptor::describe;

    fn untyped_route() -> Route {
        let closure = Closure::new(Signature::new().untyped("a").untyped("b"), |_| async {
            Ok::<_, ActionError>(heron_core::action::text_response("ok"))
        });
        Route::new("/{a}", Action::callable(closure))
    }

    #[test]
    fn test_policy_serde() {
        let policy: UnresolvedPolicy = serde_json::from_str("\"omit\"").unwrap();
        assert_eq!(policy, UnresolvedPolicy::Omit);
        assert_eq!(UnresolvedPolicy::default(), UnresolvedPolicy::Reject);
    }

    #[test]
    fn test_reject_unresolved() {
        let route = untyped_route();
        let container = ServiceContainer::new();
        let descriptor = describe(&route, &container).unwrap();
        let attributes = RouteAttributes::new().with("a", "1");

        let err = Binder::new(UnresolvedPolicy::Reject)
            .bind(&descriptor, &attributes, &container)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Binding(BindingError::Unresolved { ref parameter }) if parameter == "b"
        ));
    }

    #[test]
    fn test_omit_unresolved() {
        let route = untyped_route();
        let container = ServiceContainer::new();
        let descriptor = describe(&route, &container).unwrap();
        let attributes = RouteAttributes::new().with("a", "1");

        let bound = Binder::new(UnresolvedPolicy::Omit)
            .bind(&descriptor, &attributes, &container)
            .unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound.get("a"), Some(&Value::from("1")));
        assert!(!bound.contains("b"));
    }

    #[test]
    fn test_zero_parameters_bind_nothing() {
        let container = fixtures::blog_container();
        let route = Route::new("/", Action::named(PostController::NAME, "index"));
        let descriptor = describe(&route, &container).unwrap();

        let bound = Binder::default()
            .bind(&descriptor, &RouteAttributes::new(), &container)
            .unwrap();
        assert!(bound.is_empty());
    }

    #[test]
    fn test_plan() {
        let container = fixtures::blog_container();
        let route = Route::new("/{post}/{id}", Action::named(PostController::NAME, "show"));
        let descriptor = describe(&route, &container).unwrap();
        let attributes = RouteAttributes::new().with("id", "3");

        let plan: Vec<_> = Binder::plan(&descriptor, &attributes)
            .into_iter()
            .map(|(param, strategy)| (param.name.as_str(), strategy))
            .collect();
        assert_eq!(
            plan,
            vec![
                ("post", Strategy::EntityOrClass),
                (
                    "id",
                    Strategy::AttributePassthrough {
                        coerce_to_text: false
                    }
                ),
            ]
        );
    }
}
