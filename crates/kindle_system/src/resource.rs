//! The plugin resource contract and produced values.
//!
//! A [`Resource`] is an independently initializable subsystem. The engine
//! constructs it lazily (through a [`ResourceFactory`] found by the
//! [`PluginLoader`](crate::loader::PluginLoader)) or receives a ready
//! instance, then calls [`init()`](Resource::init) exactly once.
//!
//! `init()` receives the engine itself, so a resource can force its
//! dependencies first:
//!
//! ```
//! use kindle_system::prelude::*;
//!
//! struct Cache { options: OptionTree }
//!
//! impl Resource for Cache {
//!     fn init(&self, bootstrap: &mut Bootstrap) -> InitResult {
//!         // Make sure logging is up before the cache starts.
//!         bootstrap.run("log")?;
//!         Ok(Some(ResourceValue::new(String::from("cache ready"))))
//!     }
//!
//!     fn options(&self) -> &OptionTree {
//!         &self.options
//!     }
//! }
//! ```

use crate::bootstrap::Bootstrap;
use crate::error::Result;
use crate::options::OptionTree;
use core::any::Any;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// ResourceValue
// ─────────────────────────────────────────────────────────────────────────────

/// A type-erased value produced by a resource initializer.
///
/// Cloning is cheap: the value is shared behind an [`Arc`].
#[derive(Clone)]
pub struct ResourceValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ResourceValue {
    /// Wraps a value.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Wraps an already shared value without another allocation.
    #[must_use]
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the value as `Arc<T>` if it holds a `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Borrows the value as `&T` if it holds a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns true if the value holds a `T`.
    #[must_use]
    pub fn is<T: Any + Send + Sync>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Returns the type name of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if both handles share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl core::fmt::Debug for ResourceValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// What a resource initializer returns: a value to store, or nothing.
pub type InitResult = Result<Option<ResourceValue>>;

// ─────────────────────────────────────────────────────────────────────────────
// Resource Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A plugin resource: one named unit of bootstrap work.
///
/// # Naming
///
/// The engine files a resolved resource under its *display name*:
/// [`explicit_type()`](Self::explicit_type) if it returns one, otherwise the
/// loader's short name for [`type_name()`](Self::type_name). Both are
/// compared case-insensitively.
pub trait Resource: Send + Sync + 'static {
    /// Initializes the resource. Called at most once per engine.
    ///
    /// Returning `Ok(Some(value))` stores `value` in the container under the
    /// resource's name; `Ok(None)` stores nothing.
    ///
    /// # Errors
    ///
    /// Any error aborts the surrounding `run()`. Errors raised by nested
    /// `bootstrap.run(..)` calls should be propagated with `?`.
    fn init(&self, bootstrap: &mut Bootstrap) -> InitResult;

    /// Returns the option sub-tree this resource was constructed with.
    fn options(&self) -> &OptionTree;

    /// Returns the full type name used to derive the display name.
    ///
    /// Default implementation returns the Rust type name.
    fn type_name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Optional display-name override.
    fn explicit_type(&self) -> Option<&str> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a factory receives when the engine instantiates a resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    /// The resource's own option sub-tree.
    pub options: OptionTree,
    /// Environment name of the owning application (e.g. `"production"`).
    pub environment: String,
    /// Application namespace configured on the engine, if any.
    pub app_namespace: Option<String>,
}

/// Constructs a resource from its options.
pub type ResourceFactory = Arc<dyn Fn(ResourceOptions) -> Result<Arc<dyn Resource>> + Send + Sync>;

/// Wraps a closure as a [`ResourceFactory`].
pub fn factory<F>(f: F) -> ResourceFactory
where
    F: Fn(ResourceOptions) -> Result<Arc<dyn Resource>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Argument to [`Bootstrap::register_resource`](crate::bootstrap::Bootstrap::register_resource)
/// and [`Bootstrap::unregister_resource`](crate::bootstrap::Bootstrap::unregister_resource).
#[derive(Clone)]
pub enum ResourceRegistration {
    /// A short name, resolved lazily through the loader.
    Name(String),
    /// A constructed resource.
    Instance(Arc<dyn Resource>),
}

impl ResourceRegistration {
    /// Wraps a resource value as an instance registration.
    #[must_use]
    pub fn instance<R: Resource>(resource: R) -> Self {
        Self::Instance(Arc::new(resource))
    }
}

impl core::fmt::Debug for ResourceRegistration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Instance(r) => f.debug_tuple("Instance").field(&r.type_name()).finish(),
        }
    }
}

impl From<&str> for ResourceRegistration {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ResourceRegistration {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Arc<dyn Resource>> for ResourceRegistration {
    fn from(resource: Arc<dyn Resource>) -> Self {
        Self::Instance(resource)
    }
}

impl<R: Resource> From<Arc<R>> for ResourceRegistration {
    fn from(resource: Arc<R>) -> Self {
        Self::Instance(resource)
    }
}

/// Returns true if both handles point at the same resource instance.
pub(crate) fn same_instance(a: &Arc<dyn Resource>, b: &Arc<dyn Resource>) -> bool {
    core::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
