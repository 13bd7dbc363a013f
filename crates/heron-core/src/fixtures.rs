//! Test fixtures for Heron development and testing.
//!
//! A tiny blog domain used by tests across the workspace:
//!
//! - [`Post`] - an entity hydrated by [`PostRepository`]
//! - [`Logger`] - an interface, implemented by [`MemoryLogger`]
//! - [`PostController`] - a controller with a handful of actions
//! - [`blog_container`] - a [`ServiceContainer`] wired with all of the above
//!
//! # Example
//!
//! ```
//! use heron_core::di::{Container, ContextArgs};
//! use heron_core::fixtures;
//!
//! let container = fixtures::blog_container();
//! let prototype = container
//!     .get(fixtures::POST_TYPE, &ContextArgs::new())
//!     .unwrap();
//! assert!(prototype.is_entity());
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::{text_response, ActionFuture, Arguments, Controller, Signature, TypeRef};
use crate::di::{Lifetime, ServiceContainer};
use crate::error::{ActionError, HydrationError};
use crate::value::{Entity, Instance, ScalarType, Value};

/// Type name under which [`Post`] is registered.
pub const POST_TYPE: &str = "heron_core::fixtures::Post";

/// Type name under which the [`Logger`] interface is registered.
pub const LOGGER_TYPE: &str = "dyn heron_core::fixtures::Logger";

/// Identifier that [`PostRepository`] knows nothing about.
pub const MISSING_POST_ID: i64 = 404;

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Primary key, `None` for a prototype.
    pub id: Option<i64>,
    /// Title.
    pub title: String,
}

impl Post {
    /// An empty, unsaved post used as the hydration prototype.
    #[must_use]
    pub fn prototype() -> Self {
        Self {
            id: None,
            title: String::new(),
        }
    }
}

impl Entity for Post {
    fn entity_name(&self) -> &str {
        "post"
    }

    fn primary_key(&self) -> Option<Value> {
        self.id.map(Value::Int)
    }
}

/// Loads any numeric post id except [`MISSING_POST_ID`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PostRepository;

impl crate::di::EntityRepository for PostRepository {
    fn hydrate(
        &self,
        prototype: &dyn Entity,
        identifier: Option<&Value>,
    ) -> Result<Instance, HydrationError> {
        let raw = identifier.map(Value::to_text).transpose().ok().flatten();
        let id = raw
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|id| *id != MISSING_POST_ID)
            .ok_or_else(|| {
                HydrationError::not_found(prototype.entity_name(), raw.clone().unwrap_or_default())
            })?;

        Ok(Instance::entity(Post {
            id: Some(id),
            title: format!("Post #{id}"),
        }))
    }
}

/// A logging capability injected by interface.
pub trait Logger: Send + Sync {
    /// Records a line.
    fn log(&self, line: &str);

    /// Returns every recorded line.
    fn lines(&self) -> Vec<String>;
}

/// A [`Logger`] that keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl Logger for MemoryLogger {
    fn log(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

/// Controller exposing the blog actions.
///
/// | method | parameters |
/// |---|---|
/// | `index` | none |
/// | `show` | `post: Post`, `id: int` |
/// | `handle` | `log: dyn Logger` |
/// | `page` | `page: int = 1` |
/// | `tag` | `name` (untyped) |
#[derive(Debug, Default, Clone, Copy)]
pub struct PostController;

impl PostController {
    /// Name the controller is registered under.
    pub const NAME: &'static str = "PostController";
}

impl Controller for PostController {
    fn type_name(&self) -> &str {
        Self::NAME
    }

    fn signature(&self, method: &str) -> Option<Signature> {
        let signature = match method {
            "index" => Signature::new(),
            "show" => Signature::new()
                .param("post", TypeRef::class::<Post>())
                .param("id", TypeRef::builtin(ScalarType::Int)),
            "handle" => Signature::new().param("log", TypeRef::interface::<dyn Logger>()),
            "page" => Signature::new().param_or("page", TypeRef::builtin(ScalarType::Int), 1),
            "tag" => Signature::new().untyped("name"),
            _ => return None,
        };
        Some(signature)
    }

    fn call(&self, method: &str, args: Arguments) -> ActionFuture {
        let method = method.to_string();
        Box::pin(async move {
            let body = match method.as_str() {
                "index" => format!("index ({} args)", args.len()),
                "show" => {
                    let post = args.entity::<Post>("post")?;
                    let id = args.int("id")?;
                    format!("{} comment {id}", post.title)
                }
                "handle" => {
                    let log = args.interface::<dyn Logger>("log")?;
                    log.log("handled");
                    "logged".to_string()
                }
                "page" => match args.get("page") {
                    Some(Value::Int(page)) => format!("page {page}"),
                    _ => "page none".to_string(),
                },
                "tag" => format!("tag {}", args.text("name")?),
                other => return Err(ActionError::internal(format!("no action {other}"))),
            };
            Ok::<_, ActionError>(text_response(body))
        })
    }
}

/// Builds a container with the blog fixtures registered.
///
/// - `Post` resolves to a fresh prototype and hydrates via [`PostRepository`]
/// - `dyn Logger` resolves to a shared [`MemoryLogger`]
/// - [`PostController`] is registered under [`PostController::NAME`]
#[must_use]
pub fn blog_container() -> ServiceContainer {
    let logger: Arc<dyn Logger> = Arc::new(MemoryLogger::default());

    let mut container = ServiceContainer::new();
    container
        .factory(POST_TYPE, Lifetime::Transient, |_, _| {
            Ok(Instance::entity(Post::prototype()))
        })
        .repository(POST_TYPE, PostRepository)
        .singleton(Instance::interface(logger))
        .controller(Arc::new(PostController));
    container
}
