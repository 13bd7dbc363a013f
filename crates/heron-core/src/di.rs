//! Dependency injection container.
//!
//! The binding engine only talks to the [`Container`] trait. This module
//! also provides [`ServiceContainer`], a registry keyed by type name that is
//! good enough for applications and tests:
//!
//! - singletons registered up front, or forced at runtime
//! - factories, either transient or lazily shared
//! - interface → concrete bindings
//! - controllers, built by name for `Handler@method` routes
//! - entity repositories used for hydration
//!
//! [`Container::begin_request`] returns a [`RequestScope`]: singletons forced
//! into a scope stay in that scope, so the "current request" registered by
//! one request is never observed by another.
//!
//! # Example
//!
//! ```rust
//! use heron_core::di::{Container, ContextArgs, ServiceContainer};
//! use heron_core::value::Instance;
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! let mut container = ServiceContainer::new();
//! container.singleton(Instance::new(Database { dsn: "postgres://localhost/db".into() }));
//!
//! let db = container
//!     .get(std::any::type_name::<Database>(), &ContextArgs::new())
//!     .unwrap();
//! assert_eq!(db.downcast::<Database>().unwrap().dsn, "postgres://localhost/db");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::action::Controller;
use crate::error::{HydrationError, ResolutionError};
use crate::value::{Entity, Instance, Value};

/// Alias chains longer than this are treated as cycles.
const MAX_ALIAS_DEPTH: usize = 32;

/// Contextual constructor arguments passed along with a resolution.
///
/// The dispatcher forwards the raw route attribute of the parameter being
/// bound (keyed by the parameter name), or nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextArgs {
    values: IndexMap<String, Value>,
}

impl ContextArgs {
    /// Creates empty context arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates context arguments holding a single entry.
    pub fn single(name: impl Into<String>, value: Value) -> Self {
        let mut args = Self::new();
        args.insert(name, value);
        args
    }

    /// Adds an entry.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the first entry, whatever its name.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.values.values().next()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// The dependency injection contract consumed by the dispatcher.
///
/// Implementations must be safe to call from concurrent requests; the
/// dispatcher adds no locking of its own.
pub trait Container: Send + Sync {
    /// Resolves an instance by type name.
    fn get(&self, type_name: &str, context: &ContextArgs) -> Result<Instance, ResolutionError>;

    /// Registers `instance` as the singleton for `type_name`, replacing any
    /// previous one.
    fn force_singleton(&self, type_name: &str, instance: Instance);

    /// Loads the persisted entity matching `identifier`, using `prototype`
    /// to pick the entity type.
    fn get_instance_entity(
        &self,
        prototype: &Instance,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError>;

    /// Builds the controller registered under `type_name`.
    fn controller(&self, type_name: &str) -> Result<Arc<dyn Controller>, ResolutionError>;

    /// Opens a request scope over this container.
    fn begin_request(self: Arc<Self>) -> Arc<dyn Container>;
}

/// Loads persisted entities by identifier.
pub trait EntityRepository: Send + Sync {
    /// Hydrates the record for `identifier`.
    ///
    /// `identifier` is `None` when the route carried no value for the
    /// parameter.
    fn hydrate(
        &self,
        prototype: &dyn Entity,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError>;
}

impl<F> EntityRepository for F
where
    F: Fn(&dyn Entity, Option<&Value>) -> Result<Instance, HydrationError> + Send + Sync,
{
    fn hydrate(
        &self,
        prototype: &dyn Entity,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError> {
        self(prototype, identifier)
    }
}

/// Builds an instance. Receives the container the resolution started from,
/// so factories can resolve their own dependencies (including request-scoped
/// singletons).
pub type Factory =
    Arc<dyn Fn(&dyn Container, &ContextArgs) -> Result<Instance, ResolutionError> + Send + Sync>;

/// How long a factory-built instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// A new instance for every resolution.
    Transient,
    /// Built on first use and cached by whoever resolved it: the container
    /// itself, or the request scope the lookup ran in.
    Shared,
}

#[derive(Clone)]
struct Registration {
    factory: Factory,
    lifetime: Lifetime,
}

/// A type-name keyed service registry.
///
/// Registration happens at startup through `&mut self`; resolution is
/// `&self` and thread safe. Shared factories cache their instance in the
/// same singleton table that [`Container::force_singleton`] writes.
#[derive(Default)]
pub struct ServiceContainer {
    singletons: RwLock<HashMap<String, Instance>>,
    factories: HashMap<String, Registration>,
    bindings: HashMap<String, String>,
    controllers: HashMap<String, Arc<dyn Controller>>,
    repositories: HashMap<String, Arc<dyn EntityRepository>>,
}

impl ServiceContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a singleton under the instance's own type name.
    pub fn singleton(&mut self, instance: Instance) -> &mut Self {
        let name = instance.type_name().to_string();
        self.singletons.get_mut().insert(name, instance);
        self
    }

    /// Registers a singleton under an explicit type name.
    pub fn singleton_as(&mut self, type_name: impl Into<String>, instance: Instance) -> &mut Self {
        self.singletons.get_mut().insert(type_name.into(), instance);
        self
    }

    /// Registers a factory.
    pub fn factory<F>(&mut self, type_name: impl Into<String>, lifetime: Lifetime, factory: F) -> &mut Self
    where
        F: Fn(&dyn Container, &ContextArgs) -> Result<Instance, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(
            type_name.into(),
            Registration {
                factory: Arc::new(factory),
                lifetime,
            },
        );
        self
    }

    /// Binds an interface name to a concrete type name.
    pub fn bind(&mut self, interface: impl Into<String>, concrete: impl Into<String>) -> &mut Self {
        self.bindings.insert(interface.into(), concrete.into());
        self
    }

    /// Registers a controller under its [`Controller::type_name`].
    pub fn controller(&mut self, controller: Arc<dyn Controller>) -> &mut Self {
        self.controllers
            .insert(controller.type_name().to_string(), controller);
        self
    }

    /// Registers the repository that hydrates entities of `type_name`.
    pub fn repository(
        &mut self,
        type_name: impl Into<String>,
        repository: impl EntityRepository + 'static,
    ) -> &mut Self {
        self.repositories
            .insert(type_name.into(), Arc::new(repository));
        self
    }

    /// Returns `true` if anything can produce `type_name`.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.canonical(type_name).is_ok_and(|name| {
            self.singletons.read().contains_key(&name) || self.factories.contains_key(&name)
        })
    }

    /// Follows interface bindings to the concrete type name.
    fn canonical(&self, type_name: &str) -> Result<String, ResolutionError> {
        let mut current = type_name;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.bindings.get(current) {
                Some(next) => current = next,
                None => return Ok(current.to_string()),
            }
        }
        Err(ResolutionError::Cycle {
            type_name: type_name.to_string(),
        })
    }

    /// Resolves `type_name`, running factories against `scope`.
    ///
    /// Shared instances built here are stored in `cache`, which is the
    /// container's own singleton map for root lookups and the scope's local
    /// map for request lookups.
    fn resolve_in(
        &self,
        type_name: &str,
        context: &ContextArgs,
        scope: &dyn Container,
        cache: &RwLock<HashMap<String, Instance>>,
    ) -> Result<Instance, ResolutionError> {
        let name = self.canonical(type_name)?;

        if let Some(instance) = self.singletons.read().get(&name) {
            return Ok(instance.clone());
        }

        let registration = self
            .factories
            .get(&name)
            .ok_or_else(|| ResolutionError::not_registered(type_name))?;

        let instance = (registration.factory)(scope, context)?;
        if registration.lifetime == Lifetime::Shared {
            // A concurrent lookup may have raced us; the first instance wins.
            let mut cached = cache.write();
            return Ok(cached.entry(name).or_insert(instance).clone());
        }
        tracing::trace!(type_name = %name, "built transient instance");
        Ok(instance)
    }

    fn hydrate(
        &self,
        prototype: &Instance,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError> {
        let entity = prototype
            .as_entity()
            .ok_or_else(|| HydrationError::NotAnEntity {
                type_name: prototype.type_name().to_string(),
            })?;
        let repository =
            self.repositories
                .get(prototype.type_name())
                .ok_or_else(|| HydrationError::NoRepository {
                    type_name: prototype.type_name().to_string(),
                })?;
        repository.hydrate(entity, identifier)
    }

    fn lookup_controller(&self, type_name: &str) -> Result<Arc<dyn Controller>, ResolutionError> {
        self.controllers
            .get(type_name)
            .cloned()
            .ok_or_else(|| ResolutionError::not_registered(type_name))
    }
}

impl Container for ServiceContainer {
    fn get(&self, type_name: &str, context: &ContextArgs) -> Result<Instance, ResolutionError> {
        self.resolve_in(type_name, context, self, &self.singletons)
    }

    fn force_singleton(&self, type_name: &str, instance: Instance) {
        self.singletons.write().insert(type_name.to_string(), instance);
    }

    fn get_instance_entity(
        &self,
        prototype: &Instance,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError> {
        self.hydrate(prototype, identifier)
    }

    fn controller(&self, type_name: &str) -> Result<Arc<dyn Controller>, ResolutionError> {
        self.lookup_controller(type_name)
    }

    fn begin_request(self: Arc<Self>) -> Arc<dyn Container> {
        Arc::new(RequestScope::new(self))
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("singleton_count", &self.singletons.read().len())
            .field("factory_count", &self.factories.len())
            .field("binding_count", &self.bindings.len())
            .field("controller_count", &self.controllers.len())
            .field("repository_count", &self.repositories.len())
            .finish()
    }
}

/// A per-request overlay on a [`ServiceContainer`].
///
/// Reads check the request-local singletons first and then fall through to
/// the shared container. Writes from [`Container::force_singleton`] never
/// leave the scope, and neither do shared factory results built while the
/// scope is open, since those factories may read request-local state.
pub struct RequestScope {
    parent: Arc<ServiceContainer>,
    local: RwLock<HashMap<String, Instance>>,
}

impl RequestScope {
    /// Opens a scope over `parent`.
    #[must_use]
    pub fn new(parent: Arc<ServiceContainer>) -> Self {
        Self {
            parent,
            local: RwLock::new(HashMap::new()),
        }
    }
}

impl Container for RequestScope {
    fn get(&self, type_name: &str, context: &ContextArgs) -> Result<Instance, ResolutionError> {
        let name = self.parent.canonical(type_name)?;
        if let Some(instance) = self.local.read().get(&name) {
            return Ok(instance.clone());
        }
        self.parent.resolve_in(type_name, context, self, &self.local)
    }

    fn force_singleton(&self, type_name: &str, instance: Instance) {
        self.local.write().insert(type_name.to_string(), instance);
    }

    fn get_instance_entity(
        &self,
        prototype: &Instance,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError> {
        self.parent.hydrate(prototype, identifier)
    }

    fn controller(&self, type_name: &str) -> Result<Arc<dyn Controller>, ResolutionError> {
        self.parent.lookup_controller(type_name)
    }

    /// Opens a fresh scope over the same shared container.
    fn begin_request(self: Arc<Self>) -> Arc<dyn Container> {
        Arc::new(RequestScope::new(self.parent.clone()))
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("local_count", &self.local.read().len())
            .field("parent", &self.parent)
            .finish()
    }
}
