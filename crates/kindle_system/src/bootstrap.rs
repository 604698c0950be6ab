//! The bootstrap engine.
//!
//! [`Bootstrap`] executes named resources on demand, each at most once,
//! storing what they produce in a [`Container`].
//!
//! # Resource kinds
//!
//! - **Class resources** are handlers registered on the
//!   [`BootstrapBuilder`] while the engine is set up. They are fixed for the
//!   engine's lifetime and always run before plugin resources in
//!   [`RunTarget::All`].
//! - **Plugin resources** are [`Resource`] implementations, registered either
//!   by name (resolved lazily through the [`PluginLoader`]) or as ready
//!   instances.
//!
//! # Execution order
//!
//! Dependencies are not declared anywhere. A resource that needs another one
//! simply calls [`Bootstrap::run`] from inside its initializer, so the order
//! is a depth-first walk driven by demand. Each name moves through
//! pending → in progress → done; finding a name that is still in progress
//! means the resource (directly or transitively) requested itself, which is
//! reported as [`BootstrapError::CircularDependency`].
//!
//! # Example
//!
//! ```
//! use kindle_system::prelude::*;
//!
//! let app = Application::new("testing", OptionTree::new()).unwrap();
//! let mut bootstrap = Bootstrap::builder()
//!     .class_resource("config", |_| Ok(Some(ResourceValue::new(42_u32))))
//!     .class_resource("view", |b| {
//!         b.run("config")?;
//!         let config = b.resource_as::<u32>("config").map_or(0, |c| *c);
//!         Ok(Some(ResourceValue::new(format!("view with {config}"))))
//!     })
//!     .build(&app)
//!     .unwrap();
//!
//! bootstrap.run("view").unwrap();
//!
//! assert!(bootstrap.is_run("config"));
//! assert_eq!(
//!     bootstrap.resource_as::<String>("View").as_deref().map(String::as_str),
//!     Some("view with 42")
//! );
//! ```

use crate::application::ApplicationContext;
use crate::container::Container;
use crate::error::{BootstrapError, Result};
use crate::loader::PluginLoader;
use crate::options::{OptionTree, OptionValue, flatten_keys, merge, normalize_key};
use crate::resource::{
    InitResult, Resource, ResourceOptions, ResourceRegistration, ResourceValue, same_instance,
};
use core::any::Any;
use hashbrown::HashSet;
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Option key whose value declares plugin resources (name → option tree).
pub const RESOURCES_KEY: &str = "resources";

/// Option key whose value declares loader search pairs (prefix → path).
pub const PLUGIN_PATHS_KEY: &str = "pluginpaths";

/// Option key handled by the built-in application namespace setter.
pub const APP_NAMESPACE_KEY: &str = "appnamespace";

/// Handler of a class resource.
pub type ClassResourceHandler = Arc<dyn Fn(&mut Bootstrap) -> InitResult + Send + Sync>;

/// Handler invoked by [`Bootstrap::configure`] for a matching top-level option key.
pub type OptionSetter = Arc<dyn Fn(&mut Bootstrap, &OptionValue) -> Result<()> + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// PluginEntry
// ─────────────────────────────────────────────────────────────────────────────

/// A plugin resource as held in the engine's table.
#[derive(Clone)]
enum PluginEntry {
    /// Registered by name, not yet instantiated.
    Spec { name: String, options: OptionTree },
    /// Constructed instance.
    Resolved(Arc<dyn Resource>),
}

// ─────────────────────────────────────────────────────────────────────────────
// RunTarget
// ─────────────────────────────────────────────────────────────────────────────

/// What [`Bootstrap::run`] should execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTarget {
    /// Every class resource, then every plugin resource.
    All,
    /// A single resource.
    One(String),
    /// Several resources, in order.
    Many(Vec<String>),
}

impl From<&str> for RunTarget {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for RunTarget {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for RunTarget {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<Vec<&str>> for RunTarget {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for RunTarget {
    fn from(names: &[&str]) -> Self {
        Self::Many(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RunTarget {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl From<Option<&str>> for RunTarget {
    fn from(name: Option<&str>) -> Self {
        name.map_or(Self::All, Self::from)
    }
}

impl TryFrom<&OptionValue> for RunTarget {
    type Error = BootstrapError;

    /// Accepts null, a string, or a list of strings.
    fn try_from(value: &OptionValue) -> Result<Self> {
        match value {
            OptionValue::Null => Ok(Self::All),
            OptionValue::String(name) => Ok(Self::One(name.clone())),
            OptionValue::List(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        BootstrapError::invalid_argument(format!(
                            "resource lists may only hold names, found {}",
                            item.kind()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Many),
            other => Err(BootstrapError::invalid_argument(format!(
                "cannot bootstrap from a {} value",
                other.kind()
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BootstrapBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Sets up the fixed parts of a [`Bootstrap`]: class resources, option
/// setters, and the plugin loader.
///
/// Class resources keep registration order, which is the order
/// [`RunTarget::All`] runs them in.
pub struct BootstrapBuilder {
    class_resources: IndexMap<String, ClassResourceHandler>,
    setters: IndexMap<String, OptionSetter>,
    loader: Option<PluginLoader>,
}

impl Default for BootstrapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapBuilder {
    /// Creates a builder with the built-in `appnamespace` setter.
    #[must_use]
    pub fn new() -> Self {
        let builder = Self {
            class_resources: IndexMap::new(),
            setters: IndexMap::new(),
            loader: None,
        };
        builder.setter(APP_NAMESPACE_KEY, |bootstrap, value| {
            let namespace = value.as_str().ok_or_else(|| {
                BootstrapError::configuration(format!(
                    "'{APP_NAMESPACE_KEY}' must be a string, found {}",
                    value.kind()
                ))
            })?;
            bootstrap.set_app_namespace(namespace);
            Ok(())
        })
    }

    /// Registers a class resource under `name` (case-insensitive).
    ///
    /// Registering the same name twice replaces the handler but keeps the
    /// original position.
    #[must_use]
    pub fn class_resource<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Bootstrap) -> InitResult + Send + Sync + 'static,
    {
        self.class_resources.insert(normalize_key(name), Arc::new(handler));
        self
    }

    /// Registers a setter invoked when a configured tree holds `key` at the
    /// top level.
    #[must_use]
    pub fn setter<F>(mut self, key: &str, setter: F) -> Self
    where
        F: Fn(&mut Bootstrap, &OptionValue) -> Result<()> + Send + Sync + 'static,
    {
        self.setters.insert(normalize_key(key), Arc::new(setter));
        self
    }

    /// Uses `loader` instead of [`PluginLoader::new()`].
    #[must_use]
    pub fn loader(mut self, loader: PluginLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Builds the engine for `app` and configures it with the application's
    /// options.
    ///
    /// # Errors
    ///
    /// Returns any error raised by [`Bootstrap::configure`].
    pub fn build<A: ApplicationContext + ?Sized>(self, app: &A) -> Result<Bootstrap> {
        let mut bootstrap = Bootstrap {
            options: OptionTree::new(),
            option_keys: IndexSet::new(),
            class_resources: self.class_resources,
            setters: self.setters,
            plugin_resources: IndexMap::new(),
            run: IndexSet::new(),
            started: HashSet::new(),
            container: Container::new(),
            loader: self.loader.unwrap_or_default(),
            environment: app.environment().to_string(),
            app_namespace: None,
        };
        tracing::debug!(
            environment = %bootstrap.environment,
            class_resources = bootstrap.class_resources.len(),
            "creating bootstrap"
        );
        bootstrap.configure(app.options())?;
        Ok(bootstrap)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bootstrap
// ─────────────────────────────────────────────────────────────────────────────

/// The resource bootstrap engine.
///
/// See the [module documentation](self) for the execution model.
pub struct Bootstrap {
    /// Merged option tree.
    options: OptionTree,
    /// Lower-cased top-level keys of every configured tree.
    option_keys: IndexSet<String>,
    /// Class resources in registration order.
    class_resources: IndexMap<String, ClassResourceHandler>,
    /// Option setters keyed by lower-cased option key.
    setters: IndexMap<String, OptionSetter>,
    /// Plugin resources in registration order.
    plugin_resources: IndexMap<String, PluginEntry>,
    /// Names whose execution completed, in completion order.
    run: IndexSet<String>,
    /// Names currently executing.
    started: HashSet<String>,
    /// Produced values.
    container: Container,
    /// Resolves plugin resource names to types.
    loader: PluginLoader,
    /// Environment of the owning application.
    environment: String,
    /// Namespace set through the `appnamespace` option.
    app_namespace: Option<String>,
}

impl core::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("environment", &self.environment)
            .field("class_resources", &self.class_resource_names())
            .field(
                "plugin_resources",
                &self.plugin_resources.keys().collect::<Vec<_>>(),
            )
            .field("run", &self.run)
            .field("container", &self.container.names())
            .finish_non_exhaustive()
    }
}

impl Bootstrap {
    /// Returns a builder for registering class resources and setters.
    #[must_use]
    pub fn builder() -> BootstrapBuilder {
        BootstrapBuilder::new()
    }

    /// Creates an engine with no class resources for `app`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while configuring from the application's options.
    pub fn new<A: ApplicationContext + ?Sized>(app: &A) -> Result<Self> {
        Self::builder().build(app)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Options
    // ─────────────────────────────────────────────────────────────────────────

    /// Merges `options` into the engine and applies its top-level keys.
    ///
    /// - `pluginpaths` (prefix → path or list of paths) is added to the loader.
    /// - Keys with a registered setter invoke that setter.
    /// - `resources` (name → option tree) registers each entry as a plugin
    ///   resource by name.
    /// - Anything else is kept as plain option data.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if `pluginpaths` or
    /// `resources` are malformed, or whatever a setter returns.
    pub fn configure(&mut self, options: &OptionTree) -> Result<&mut Self> {
        self.options = merge(&self.options, options);
        let options = options.lowercase_keys();
        self.option_keys.extend(flatten_keys(&options));

        if let Some(paths) = options.get(PLUGIN_PATHS_KEY) {
            self.add_plugin_paths(paths)?;
        }

        for (key, value) in &options {
            if key == PLUGIN_PATHS_KEY {
                continue;
            }
            if let Some(setter) = self.setters.get(key.as_str()).cloned() {
                tracing::debug!(option = %key, "applying option setter");
                setter(self, value)?;
            } else if key == RESOURCES_KEY {
                self.register_declared_resources(value)?;
            }
        }

        Ok(self)
    }

    /// Returns the merged option tree.
    #[must_use]
    pub fn options(&self) -> &OptionTree {
        &self.options
    }

    /// Returns true if `key` was a top-level key of any configured tree.
    #[must_use]
    pub fn has_option(&self, key: &str) -> bool {
        self.option_keys.contains(&normalize_key(key))
    }

    /// Returns the top-level option `key`, case-insensitively.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        if self.has_option(key) {
            self.options.get(key)
        } else {
            None
        }
    }

    fn add_plugin_paths(&mut self, value: &OptionValue) -> Result<()> {
        let tree = value.as_tree().ok_or_else(|| {
            BootstrapError::configuration(format!(
                "'{PLUGIN_PATHS_KEY}' must map prefixes to paths, found {}",
                value.kind()
            ))
        })?;
        for (prefix, paths) in tree {
            match paths {
                OptionValue::String(path) => {
                    self.loader.add_prefix_path(prefix, path)?;
                }
                OptionValue::List(list) => {
                    for path in list {
                        let path = path.as_str().ok_or_else(|| {
                            BootstrapError::configuration(format!(
                                "paths for prefix '{prefix}' must be strings, found {}",
                                path.kind()
                            ))
                        })?;
                        self.loader.add_prefix_path(prefix, path)?;
                    }
                }
                other => {
                    return Err(BootstrapError::configuration(format!(
                        "paths for prefix '{prefix}' must be a string or a list, found {}",
                        other.kind()
                    )));
                }
            }
        }
        Ok(())
    }

    fn register_declared_resources(&mut self, value: &OptionValue) -> Result<()> {
        let declared = value.as_tree().ok_or_else(|| {
            BootstrapError::configuration(format!(
                "'{RESOURCES_KEY}' must map resource names to options, found {}",
                value.kind()
            ))
        })?;
        for (name, options) in declared {
            let options = match options {
                OptionValue::Tree(tree) => tree.clone(),
                OptionValue::Null => OptionTree::new(),
                other => {
                    return Err(BootstrapError::configuration(format!(
                        "options for resource '{name}' must be a tree, found {}",
                        other.kind()
                    )));
                }
            };
            self.register_resource(name.as_str(), options)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Environment
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the environment name of the owning application.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Returns the application namespace, if one was configured.
    #[must_use]
    pub fn app_namespace(&self) -> Option<&str> {
        self.app_namespace.as_deref()
    }

    /// Sets the application namespace passed to resource factories.
    pub fn set_app_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.app_namespace = Some(namespace.into());
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Loader
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the plugin loader.
    #[must_use]
    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// Returns the plugin loader mutably, e.g. to add search pairs or types.
    pub fn loader_mut(&mut self) -> &mut PluginLoader {
        &mut self.loader
    }

    /// Replaces the plugin loader.
    pub fn set_loader(&mut self, loader: PluginLoader) -> &mut Self {
        self.loader = loader;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Class Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the class resource names in registration order.
    #[must_use]
    pub fn class_resource_names(&self) -> Vec<String> {
        self.class_resources.keys().cloned().collect()
    }

    /// Returns true if a class resource named `name` exists.
    #[must_use]
    pub fn has_class_resource(&self, name: &str) -> bool {
        self.class_resources.contains_key(&normalize_key(name))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugin Resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a plugin resource.
    ///
    /// A name is stored unresolved together with `options`; an instance is
    /// stored under its display name and `options` is ignored (the instance
    /// carries its own).
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if the name is empty.
    pub fn register_resource(
        &mut self,
        resource: impl Into<ResourceRegistration>,
        options: OptionTree,
    ) -> Result<&mut Self> {
        match resource.into() {
            ResourceRegistration::Instance(instance) => {
                let name = self.display_name(instance.as_ref());
                tracing::debug!(resource = %name, kind = "instance", "registering plugin resource");
                self.plugin_resources.insert(name, PluginEntry::Resolved(instance));
            }
            ResourceRegistration::Name(name) => {
                if name.trim().is_empty() {
                    return Err(BootstrapError::configuration(
                        "plugin resources must be registered with a name or an instance",
                    ));
                }
                tracing::debug!(resource = %name, kind = "name", "registering plugin resource");
                self.plugin_resources
                    .insert(normalize_key(&name), PluginEntry::Spec { name, options });
            }
        }
        Ok(self)
    }

    /// Removes a plugin resource by name or by instance identity. Absent
    /// entries are ignored.
    pub fn unregister_resource(&mut self, resource: impl Into<ResourceRegistration>) -> &mut Self {
        match resource.into() {
            ResourceRegistration::Instance(instance) => {
                self.plugin_resources.retain(|_, entry| {
                    !matches!(entry, PluginEntry::Resolved(r) if same_instance(r, &instance))
                });
            }
            ResourceRegistration::Name(name) => {
                self.plugin_resources.shift_remove(&normalize_key(&name));
            }
        }
        self
    }

    /// Returns true if `name` matches a registered plugin resource.
    ///
    /// This may resolve unresolved entries, see [`plugin_resource()`](Self::plugin_resource).
    ///
    /// # Errors
    ///
    /// Same as [`plugin_resource()`](Self::plugin_resource).
    pub fn has_plugin_resource(&mut self, name: &str) -> Result<bool> {
        Ok(self.plugin_resource(name)?.is_some())
    }

    /// Looks up a plugin resource, instantiating it if needed.
    ///
    /// A direct match on the (lower-cased) registration key is resolved
    /// through the loader. Otherwise every entry is resolved in turn and its
    /// display name compared to `name`, which instantiates unresolved entries
    /// as a side effect.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::Configuration`] if the entry registered under
    ///   `name` has no loadable type
    /// - any error returned by a resource factory
    pub fn plugin_resource(&mut self, name: &str) -> Result<Option<Arc<dyn Resource>>> {
        let key = normalize_key(name);

        let direct = match self.plugin_resources.get(&key) {
            Some(PluginEntry::Resolved(instance)) => return Ok(Some(Arc::clone(instance))),
            Some(PluginEntry::Spec { .. }) => true,
            None => false,
        };
        if direct {
            let Some(resolved) = self.load_plugin_resource(&key)? else {
                return Err(BootstrapError::configuration(format!(
                    "unable to resolve plugin '{key}'; no corresponding plugin with that name"
                )));
            };
            return Ok(self.resolved(&resolved));
        }

        tracing::debug!(resource = %key, "scanning plugin resources by display name");
        let keys: Vec<String> = self.plugin_resources.keys().cloned().collect();
        for plugin in keys {
            match self.plugin_resources.get(&plugin).cloned() {
                Some(PluginEntry::Resolved(instance)) => {
                    let plugin_name = self.display_name(instance.as_ref());
                    if plugin_name == key {
                        if plugin != plugin_name {
                            self.rekey(&plugin, plugin_name, Arc::clone(&instance));
                        }
                        return Ok(Some(instance));
                    }
                }
                Some(PluginEntry::Spec { name, options }) => {
                    if let Some(resolved) = self.load_plugin_resource(&plugin)? {
                        if resolved == key {
                            return Ok(self.resolved(&resolved));
                        }
                        continue;
                    }
                    // Registered under a full type name rather than a short name.
                    if let Some(instance) = self.instantiate_by_type_name(&name, options)? {
                        let plugin_name = self.display_name(instance.as_ref());
                        self.rekey(&plugin, plugin_name.clone(), Arc::clone(&instance));
                        if plugin_name == key {
                            return Ok(Some(instance));
                        }
                    }
                }
                None => {}
            }
        }

        Ok(None)
    }

    /// Resolves every plugin resource and returns them in table order.
    ///
    /// # Errors
    ///
    /// Same as [`plugin_resource()`](Self::plugin_resource).
    pub fn plugin_resources(&mut self) -> Result<Vec<(String, Arc<dyn Resource>)>> {
        let keys: Vec<String> = self.plugin_resources.keys().cloned().collect();
        for key in keys {
            // Entries may be re-keyed while earlier ones resolve.
            if self.plugin_resources.contains_key(&key) {
                self.plugin_resource(&key)?;
            }
        }
        Ok(self
            .plugin_resources
            .iter()
            .filter_map(|(name, entry)| match entry {
                PluginEntry::Resolved(instance) => Some((name.clone(), Arc::clone(instance))),
                PluginEntry::Spec { .. } => None,
            })
            .collect())
    }

    /// Resolves every plugin resource and returns their names in table order.
    ///
    /// # Errors
    ///
    /// Same as [`plugin_resource()`](Self::plugin_resource).
    pub fn plugin_resource_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .plugin_resources()?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Display name of a resolved resource: its explicit type, or the
    /// loader's short name for its type name, lower-cased.
    fn display_name(&self, resource: &dyn Resource) -> String {
        let name = match resource.explicit_type() {
            Some(explicit) => explicit.to_string(),
            None => self.loader.short_name_for(resource.type_name()),
        };
        normalize_key(&name)
    }

    /// Instantiates the unresolved entry under `key` through the loader and
    /// files it under its resolved name. Returns that name, or `None` if the
    /// loader has no type for `key`.
    fn load_plugin_resource(&mut self, key: &str) -> Result<Option<String>> {
        let Some(PluginEntry::Spec { options, .. }) = self.plugin_resources.get(key).cloned() else {
            return Ok(None);
        };
        let Some(loadable) = self.loader.resolve(key) else {
            return Ok(None);
        };

        let instance = (loadable.factory())(self.resource_options(options))?;
        let name = normalize_key(instance.explicit_type().unwrap_or(key));
        tracing::debug!(
            resource = %name,
            type_name = %loadable.type_name(),
            "instantiated plugin resource"
        );
        self.rekey(key, name.clone(), instance);
        Ok(Some(name))
    }

    fn instantiate_by_type_name(
        &mut self,
        type_name: &str,
        options: OptionTree,
    ) -> Result<Option<Arc<dyn Resource>>> {
        let Some(loadable) = self.loader.find_type(type_name) else {
            return Ok(None);
        };
        let instance = (loadable.factory())(self.resource_options(options))?;
        Ok(Some(instance))
    }

    fn resource_options(&self, options: OptionTree) -> ResourceOptions {
        ResourceOptions {
            options,
            environment: self.environment.clone(),
            app_namespace: self.app_namespace.clone(),
        }
    }

    fn resolved(&self, key: &str) -> Option<Arc<dyn Resource>> {
        match self.plugin_resources.get(key) {
            Some(PluginEntry::Resolved(instance)) => Some(Arc::clone(instance)),
            _ => None,
        }
    }

    /// Replaces the entry under `old` with `instance` filed under `new`,
    /// keeping its position in the table.
    fn rekey(&mut self, old: &str, new: String, instance: Arc<dyn Resource>) {
        let entry = PluginEntry::Resolved(instance);
        if old == new {
            self.plugin_resources.insert(new, entry);
            return;
        }
        let index = self.plugin_resources.get_index_of(old);
        self.plugin_resources.shift_remove(old);
        match index {
            Some(index) if !self.plugin_resources.contains_key(&new) => {
                self.plugin_resources.shift_insert(index, new, entry);
            }
            _ => {
                self.plugin_resources.insert(new, entry);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Container Access
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the container of produced values.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns the container mutably, for resources that publish extra values.
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Returns true if a value is stored under `name`.
    #[must_use]
    pub fn has_resource(&self, name: &str) -> bool {
        self.container.has(name)
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<ResourceValue> {
        self.container.get(name)
    }

    /// Returns the value stored under `name` if it is a `T`.
    #[must_use]
    pub fn resource_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.container.get_as::<T>(name)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Bootstraps one resource, several, or all of them.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::InvalidArgument`] for an empty name
    /// - any error from [`execute()`](Self::execute); execution stops at the
    ///   first failure
    pub fn run(&mut self, target: impl Into<RunTarget>) -> Result<&mut Self> {
        let target = target.into();
        let _span = tracing::info_span!("bootstrap.run", target = ?target).entered();

        match target {
            RunTarget::All => {
                for name in self.class_resource_names() {
                    self.execute(&name)?;
                }
                for name in self.plugin_resource_names()? {
                    self.execute(&name)?;
                }
            }
            RunTarget::One(name) => {
                ensure_name(&name)?;
                self.execute(&name)?;
            }
            RunTarget::Many(names) => {
                for name in &names {
                    ensure_name(name)?;
                    self.execute(name)?;
                }
            }
        }

        Ok(self)
    }

    /// Bootstraps everything. Shorthand for `run(RunTarget::All)`.
    ///
    /// # Errors
    ///
    /// Same as [`run()`](Self::run).
    pub fn run_all(&mut self) -> Result<&mut Self> {
        self.run(RunTarget::All)
    }

    /// Executes a single resource at most once.
    ///
    /// Already executed names return immediately. Class resources take
    /// precedence over plugin resources of the same name.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::CircularDependency`] if `name` is already executing
    /// - [`BootstrapError::ResourceNotFound`] if nothing matches `name`
    /// - any error returned by the resource or its factory
    pub fn execute(&mut self, name: &str) -> Result<()> {
        let key = normalize_key(name);

        if self.run.contains(&key) {
            tracing::trace!(resource = %key, "resource already bootstrapped");
            return Ok(());
        }

        if self.started.contains(&key) {
            tracing::warn!(resource = %key, "circular resource dependency detected");
            return Err(BootstrapError::circular(name));
        }

        if let Some(handler) = self.class_resources.get(&key).cloned() {
            tracing::debug!(resource = %key, kind = "class", "executing resource");
            return self.invoke(&key, |bootstrap| handler(bootstrap));
        }

        // Resolved once: resolution may re-key the entry under its display name.
        let Some(plugin) = self.plugin_resource(name)? else {
            return Err(BootstrapError::not_found(name));
        };
        tracing::debug!(resource = %key, kind = "plugin", "executing resource");
        self.invoke(&key, |bootstrap| plugin.init(bootstrap))
    }

    /// Returns true if `name` has finished executing.
    #[must_use]
    pub fn is_run(&self, name: &str) -> bool {
        self.run.contains(&normalize_key(name))
    }

    /// Returns the executed names (lower-case) in completion order.
    #[must_use]
    pub fn run_names(&self) -> Vec<&str> {
        self.run.iter().map(String::as_str).collect()
    }

    /// Marks `key` in progress around `init`, then records the outcome.
    ///
    /// The in-progress mark is cleared on failure too, so the error is not
    /// mistaken for a cycle by a later call.
    fn invoke(&mut self, key: &str, init: impl FnOnce(&mut Self) -> InitResult) -> Result<()> {
        self.started.insert(key.to_string());
        let outcome = init(self);
        self.started.remove(key);

        let value = outcome?;
        self.run.insert(key.to_string());
        tracing::debug!(resource = %key, stored = value.is_some(), "resource bootstrapped");
        if let Some(value) = value {
            self.container.set_value(key, value);
        }
        Ok(())
    }
}

fn ensure_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BootstrapError::invalid_argument(
            "resource names passed to run() must not be empty",
        ));
    }
    Ok(())
}
