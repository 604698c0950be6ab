//! Plugin loader: maps short resource names to loadable resource types.
//!
//! The loader owns two things:
//!
//! - An ordered list of `(prefix, path)` search pairs. Later pairs shadow
//!   earlier ones: [`resolve()`](PluginLoader::resolve) walks the list in
//!   reverse.
//! - A catalogue of [`LoadableType`]s, each provided under a path. A type is
//!   loadable through a pair when it lives under the pair's path and its full
//!   name is the pair's prefix followed by the short name.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kindle_system::loader::PluginLoader;
//! use kindle_system::resource::factory;
//! # use kindle_system::prelude::*;
//! # struct Cache(OptionTree);
//! # impl Resource for Cache {
//! #     fn init(&self, _: &mut Bootstrap) -> InitResult { Ok(None) }
//! #     fn options(&self) -> &OptionTree { &self.0 }
//! # }
//!
//! let mut loader = PluginLoader::empty();
//! loader.add_prefix_path("my_app::resource", "my_app/resource").unwrap();
//! loader.provide(
//!     "my_app/resource",
//!     "my_app::resource::Cache",
//!     factory(|opts| Ok(Arc::new(Cache(opts.options)))),
//! );
//!
//! assert!(loader.resolve("cache").is_some());
//! assert_eq!(loader.short_name_for("my_app::resource::Cache"), "Cache");
//! ```

use crate::error::{BootstrapError, Result};
use crate::options::normalize_key;
use crate::resource::ResourceFactory;
use hashbrown::HashMap;

/// Prefix searched by every loader created with [`PluginLoader::new`].
pub const DEFAULT_PREFIX: &str = "kindle::resource";

/// Path paired with [`DEFAULT_PREFIX`].
pub const DEFAULT_PATH: &str = "kindle/resource";

/// Characters separating a prefix from the rest of a type name.
const SEPARATORS: &[char] = &[':', '_'];

/// A resource type the loader knows how to construct.
#[derive(Clone)]
pub struct LoadableType {
    type_name: String,
    factory: ResourceFactory,
}

impl LoadableType {
    /// Returns the full type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the factory that constructs instances of this type.
    #[must_use]
    pub fn factory(&self) -> &ResourceFactory {
        &self.factory
    }
}

impl core::fmt::Debug for LoadableType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoadableType")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Resolves short resource names to [`LoadableType`]s.
#[derive(Clone)]
pub struct PluginLoader {
    /// Search pairs in registration order.
    paths: Vec<(String, String)>,
    /// Types provided under each path.
    catalog: HashMap<String, Vec<LoadableType>>,
    /// Lower-cased short name → type name, for successful resolutions.
    loaded: HashMap<String, String>,
}

impl core::fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PluginLoader")
            .field("paths", &self.paths)
            .field("types", &self.catalog.values().flatten().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginLoader {
    /// Creates a loader searching [`DEFAULT_PREFIX`] at [`DEFAULT_PATH`].
    #[must_use]
    pub fn new() -> Self {
        let mut loader = Self::empty();
        loader
            .paths
            .push((DEFAULT_PREFIX.to_string(), DEFAULT_PATH.to_string()));
        loader
    }

    /// Creates a loader with no search pairs and an empty catalogue.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            paths: Vec::new(),
            catalog: HashMap::new(),
            loaded: HashMap::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Search Paths
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a `(prefix, path)` pair. It is tried before every pair added
    /// earlier.
    ///
    /// Trailing separator characters on the prefix are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if the prefix or path is empty.
    pub fn add_prefix_path(&mut self, prefix: &str, path: &str) -> Result<&mut Self> {
        let prefix = prefix.trim_end_matches(SEPARATORS);
        if prefix.is_empty() || path.is_empty() {
            return Err(BootstrapError::configuration(format!(
                "plugin path pairs need a prefix and a path (got '{prefix}' => '{path}')"
            )));
        }
        tracing::debug!(prefix, path, "adding plugin prefix path");
        self.paths.push((prefix.to_string(), path.to_string()));
        Ok(self)
    }

    /// Removes every pair registered with `prefix`. Returns true if any was removed.
    pub fn remove_prefix_path(&mut self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches(SEPARATORS);
        let before = self.paths.len();
        self.paths.retain(|(p, _)| p != prefix);
        self.paths.len() != before
    }

    /// Removes all search pairs. Provided types stay in the catalogue.
    pub fn clear_paths(&mut self) {
        self.paths.clear();
    }

    /// Returns the search pairs in registration order.
    #[must_use]
    pub fn paths(&self) -> Vec<(&str, &str)> {
        self.paths
            .iter()
            .map(|(prefix, path)| (prefix.as_str(), path.as_str()))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalogue
    // ─────────────────────────────────────────────────────────────────────────

    /// Makes a type loadable from `path`, replacing a type of the same name
    /// already provided there.
    pub fn provide(&mut self, path: &str, type_name: &str, factory: ResourceFactory) -> &mut Self {
        let types = self.catalog.entry(path.to_string()).or_default();
        types.retain(|t| !t.type_name.eq_ignore_ascii_case(type_name));
        types.push(LoadableType {
            type_name: type_name.to_string(),
            factory,
        });
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Finds the loadable type for `short_name`, trying the most recently
    /// added pair first.
    pub fn resolve(&mut self, short_name: &str) -> Option<LoadableType> {
        let found = self.paths.iter().rev().find_map(|(prefix, path)| {
            self.catalog.get(path)?.iter().find(|t| {
                strip_prefix_ci(&t.type_name, prefix)
                    .is_some_and(|rest| rest.trim_matches(SEPARATORS).eq_ignore_ascii_case(short_name))
            })
        });

        match found {
            Some(t) => {
                tracing::debug!(short_name, type_name = %t.type_name, "resolved plugin resource type");
                let t = t.clone();
                self.loaded
                    .insert(normalize_key(short_name), t.type_name.clone());
                Some(t)
            }
            None => {
                tracing::debug!(short_name, "no plugin resource type found");
                None
            }
        }
    }

    /// Finds a provided type by its full name, regardless of search pairs.
    #[must_use]
    pub fn find_type(&self, type_name: &str) -> Option<LoadableType> {
        self.catalog
            .values()
            .flatten()
            .find(|t| t.type_name.eq_ignore_ascii_case(type_name))
            .cloned()
    }

    /// Returns true if `short_name` was resolved before.
    #[must_use]
    pub fn is_loaded(&self, short_name: &str) -> bool {
        self.loaded.contains_key(&normalize_key(short_name))
    }

    /// Returns the type name `short_name` resolved to, if it was resolved before.
    #[must_use]
    pub fn class_name(&self, short_name: &str) -> Option<&str> {
        self.loaded
            .get(&normalize_key(short_name))
            .map(String::as_str)
    }

    /// Derives a short name from a full type name.
    ///
    /// The longest registered prefix that `type_name` starts with is stripped
    /// and separator characters are trimmed. Falls back to the full type name
    /// when no prefix matches.
    #[must_use]
    pub fn short_name_for(&self, type_name: &str) -> String {
        let best = self
            .paths
            .iter()
            .filter_map(|(prefix, _)| {
                strip_prefix_ci(type_name, prefix).map(|rest| (prefix.len(), rest))
            })
            // Ties go to the earliest pair; equal prefixes strip identically.
            .fold(None::<(usize, &str)>, |best, candidate| match best {
                Some((len, _)) if len >= candidate.0 => best,
                _ => Some(candidate),
            });

        match best.map(|(_, rest)| rest.trim_matches(SEPARATORS)) {
            Some(short) if !short.is_empty() => short.to_string(),
            _ => type_name.to_string(),
        }
    }
}

/// Strips `prefix` from `s`, comparing ASCII case-insensitively.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len() || !s.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = s.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::Bootstrap;
    use crate::options::OptionTree;
    use crate::resource::{InitResult, Resource, factory};
    use std::sync::Arc;

    struct Named(&'static str, OptionTree);

    impl Resource for Named {
        fn init(&self, _bootstrap: &mut Bootstrap) -> InitResult {
            Ok(None)
        }

        fn options(&self) -> &OptionTree {
            &self.1
        }

        fn type_name(&self) -> &str {
            self.0
        }
    }

    fn named(tag: &'static str) -> ResourceFactory {
        factory(move |opts| Ok(Arc::new(Named(tag, opts.options))))
    }

    #[test]
    fn new_has_default_pair() {
        let loader = PluginLoader::new();
        assert_eq!(loader.paths(), vec![(DEFAULT_PREFIX, DEFAULT_PATH)]);
        assert!(PluginLoader::empty().paths().is_empty());
    }

    #[test]
    fn add_prefix_path_trims_and_validates() {
        let mut loader = PluginLoader::empty();
        loader.add_prefix_path("App_Resource_", "app/resource").unwrap();
        assert_eq!(loader.paths(), vec![("App_Resource", "app/resource")]);

        assert!(matches!(
            loader.add_prefix_path("", "x"),
            Err(BootstrapError::Configuration(_))
        ));
        assert!(matches!(
            loader.add_prefix_path("p", ""),
            Err(BootstrapError::Configuration(_))
        ));
    }

    #[test]
    fn resolve_case_insensitive_short_name() {
        let mut loader = PluginLoader::new();
        loader.provide(DEFAULT_PATH, "kindle::resource::FrontController", named("fc"));

        let t = loader.resolve("frontcontroller").unwrap();
        assert_eq!(t.type_name(), "kindle::resource::FrontController");
        assert!(loader.is_loaded("FrontController"));
        assert_eq!(
            loader.class_name("frontcontroller"),
            Some("kindle::resource::FrontController")
        );
    }

    #[test]
    fn resolve_prefers_latest_pair() {
        let mut loader = PluginLoader::empty();
        loader.add_prefix_path("core::resource", "core").unwrap();
        loader.add_prefix_path("app::resource", "app").unwrap();
        loader.provide("core", "core::resource::Log", named("core"));
        loader.provide("app", "app::resource::Log", named("app"));

        let t = loader.resolve("log").unwrap();
        assert_eq!(t.type_name(), "app::resource::Log");

        assert!(loader.remove_prefix_path("app::resource"));
        let t = loader.resolve("log").unwrap();
        assert_eq!(t.type_name(), "core::resource::Log");
    }

    #[test]
    fn resolve_requires_matching_path() {
        let mut loader = PluginLoader::empty();
        loader.add_prefix_path("app::resource", "app").unwrap();
        loader.provide("elsewhere", "app::resource::Log", named("x"));

        assert!(loader.resolve("log").is_none());
        assert!(!loader.is_loaded("log"));
    }

    #[test]
    fn resolve_underscore_style_names() {
        let mut loader = PluginLoader::empty();
        loader.add_prefix_path("App_Resource", "App/Resource").unwrap();
        loader.provide("App/Resource", "App_Resource_Layout", named("layout"));

        assert!(loader.resolve("layout").is_some());
        assert!(loader.resolve("out").is_none());
    }

    #[test]
    fn provide_replaces_same_type() {
        let mut loader = PluginLoader::new();
        loader.provide(DEFAULT_PATH, "kindle::resource::Log", named("one"));
        loader.provide(DEFAULT_PATH, "kindle::resource::LOG", named("two"));

        let t = loader.resolve("log").unwrap();
        assert_eq!(t.type_name(), "kindle::resource::LOG");
    }

    #[test]
    fn short_name_strips_prefix() {
        let mut loader = PluginLoader::new();
        loader.add_prefix_path("App_Resource", "app").unwrap();

        assert_eq!(
            loader.short_name_for("kindle::resource::FrontController"),
            "FrontController"
        );
        assert_eq!(loader.short_name_for("App_Resource_Session"), "Session");
        assert_eq!(loader.short_name_for("other::Thing"), "other::Thing");
    }

    #[test]
    fn short_name_uses_longest_prefix() {
        let mut loader = PluginLoader::empty();
        loader.add_prefix_path("app", "a").unwrap();
        loader.add_prefix_path("app::resource", "b").unwrap();

        assert_eq!(loader.short_name_for("app::resource::Cache"), "Cache");
        assert_eq!(loader.short_name_for("app::Other"), "Other");
    }

    #[test]
    fn short_name_falls_back_when_only_prefix() {
        let loader = PluginLoader::new();
        assert_eq!(loader.short_name_for(DEFAULT_PREFIX), DEFAULT_PREFIX);
    }

    #[test]
    fn find_type_ignores_paths() {
        let mut loader = PluginLoader::empty();
        loader.provide("anywhere", "other::Thing", named("thing"));

        assert!(loader.resolve("thing").is_none());
        let t = loader.find_type("OTHER::thing").unwrap();
        assert_eq!(t.type_name(), "other::Thing");
        assert!(loader.find_type("other::Missing").is_none());
    }

    #[test]
    fn clear_paths_disables_resolution() {
        let mut loader = PluginLoader::new();
        loader.provide(DEFAULT_PATH, "kindle::resource::Log", named("log"));
        loader.clear_paths();
        assert!(loader.resolve("log").is_none());
    }
}
