//! The application context an engine is created for.
//!
//! An [`Application`] holds the environment name and the seed option tree,
//! and owns the [`Bootstrap`] built from them.

use crate::bootstrap::{Bootstrap, RunTarget};
use crate::error::{BootstrapError, Result};
use crate::options::{OptionTree, OptionValue, flatten_keys, merge, normalize_key};
use indexmap::IndexSet;

/// Option key describing where the host's bootstrap lives.
pub const BOOTSTRAP_KEY: &str = "bootstrap";

/// Bootstrap type name assumed when only a path is configured.
pub const DEFAULT_BOOTSTRAP_CLASS: &str = "Bootstrap";

/// What an engine needs from its owner.
pub trait ApplicationContext {
    /// Environment name, e.g. `"production"`.
    fn environment(&self) -> &str;

    /// Seed options.
    fn options(&self) -> &OptionTree;
}

/// The default [`ApplicationContext`].
///
/// # Example
///
/// ```
/// use kindle_system::prelude::*;
///
/// let mut app = Application::from_json(
///     "development",
///     r#"{"resources": {}, "bootstrap": {"path": "app/Bootstrap.rs"}}"#,
/// )
/// .unwrap();
///
/// assert_eq!(app.bootstrap_path(), Some("app/Bootstrap.rs"));
/// assert_eq!(app.bootstrap_class(), Some("Bootstrap"));
/// app.bootstrap_resources(RunTarget::All).unwrap();
/// ```
#[derive(Debug)]
pub struct Application {
    environment: String,
    options: OptionTree,
    option_keys: IndexSet<String>,
    bootstrap_path: Option<String>,
    bootstrap_class: Option<String>,
    bootstrap: Option<Bootstrap>,
}

impl ApplicationContext for Application {
    fn environment(&self) -> &str {
        &self.environment
    }

    fn options(&self) -> &OptionTree {
        &self.options
    }
}

impl Application {
    /// Creates an application for `environment` seeded with `options`.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if the `bootstrap` option is
    /// a tree without `path`, or neither a string nor a tree.
    pub fn new(environment: impl Into<String>, options: OptionTree) -> Result<Self> {
        let mut app = Self {
            environment: environment.into(),
            options: OptionTree::new(),
            option_keys: IndexSet::new(),
            bootstrap_path: None,
            bootstrap_class: None,
            bootstrap: None,
        };
        app.set_options(options)?;
        Ok(app)
    }

    /// Creates an application from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if `json` is not an object,
    /// or for the reasons listed on [`new()`](Self::new).
    pub fn from_json(environment: impl Into<String>, json: &str) -> Result<Self> {
        Self::new(environment, OptionTree::from_json_str(json)?)
    }

    /// Replaces the option tree and re-reads the `bootstrap` option.
    ///
    /// # Errors
    ///
    /// Same as [`new()`](Self::new).
    pub fn set_options(&mut self, options: OptionTree) -> Result<&mut Self> {
        self.option_keys = flatten_keys(&options);
        self.options = options;

        let bootstrap = self.options.get(BOOTSTRAP_KEY).cloned();
        match bootstrap {
            None | Some(OptionValue::Null) => {}
            Some(OptionValue::String(path)) if path.is_empty() => {}
            Some(OptionValue::String(path)) => {
                self.set_bootstrap_location(path, None);
            }
            Some(OptionValue::Tree(tree)) if tree.is_empty() => {}
            Some(OptionValue::Tree(tree)) => {
                let path = tree
                    .get("path")
                    .and_then(OptionValue::as_str)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| BootstrapError::configuration("No bootstrap path provided"))?;
                let class = tree
                    .get("class")
                    .and_then(OptionValue::as_str)
                    .filter(|c| !c.is_empty());
                self.set_bootstrap_location(path.to_string(), class.map(str::to_string));
            }
            Some(other) => {
                return Err(BootstrapError::configuration(format!(
                    "Invalid bootstrap information provided ({})",
                    other.kind()
                )));
            }
        }

        Ok(self)
    }

    fn set_bootstrap_location(&mut self, path: String, class: Option<String>) {
        tracing::debug!(path = %path, class = ?class, "recorded bootstrap location");
        self.bootstrap_path = Some(path);
        self.bootstrap_class = Some(class.unwrap_or_else(|| DEFAULT_BOOTSTRAP_CLASS.to_string()));
    }

    /// Returns true if `key` is a top-level option, case-insensitively.
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

    /// Deep-merges `overlay` into the current options.
    ///
    /// # Errors
    ///
    /// Same as [`set_options()`](Self::set_options).
    pub fn merge_options(&mut self, overlay: &OptionTree) -> Result<&mut Self> {
        let merged = merge(&self.options, overlay);
        self.set_options(merged)
    }

    /// Location of the host's bootstrap, if configured.
    #[must_use]
    pub fn bootstrap_path(&self) -> Option<&str> {
        self.bootstrap_path.as_deref()
    }

    /// Type name of the host's bootstrap, if a location is configured.
    #[must_use]
    pub fn bootstrap_class(&self) -> Option<&str> {
        self.bootstrap_class.as_deref()
    }

    /// Installs a custom engine, replacing any existing one.
    pub fn with_bootstrap(&mut self, bootstrap: Bootstrap) -> &mut Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Returns the engine, creating a default one on first use.
    ///
    /// # Errors
    ///
    /// Returns any error raised while configuring a new engine.
    pub fn bootstrap(&mut self) -> Result<&mut Bootstrap> {
        let bootstrap = match self.bootstrap.take() {
            Some(bootstrap) => bootstrap,
            None => Bootstrap::new(&*self)?,
        };
        Ok(self.bootstrap.insert(bootstrap))
    }

    /// Runs `target` on the engine.
    ///
    /// # Errors
    ///
    /// Same as [`Bootstrap::run`].
    pub fn bootstrap_resources(&mut self, target: impl Into<RunTarget>) -> Result<&mut Self> {
        self.bootstrap()?.run(target)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(json: &str) -> Result<Application> {
        Application::from_json("testing", json)
    }

    #[test]
    fn options_are_case_insensitive() {
        let app = app(r#"{"Includepaths": ["lib"], "Custom": {"a": 1}}"#).unwrap();
        assert_eq!(app.environment(), "testing");
        assert!(app.has_option("includePaths"));
        assert!(app.option("custom").is_some_and(OptionValue::is_tree));
        assert!(app.option("missing").is_none());
    }

    #[test]
    fn bootstrap_string_uses_default_class() {
        let app = app(r#"{"bootstrap": "app/bootstrap"}"#).unwrap();
        assert_eq!(app.bootstrap_path(), Some("app/bootstrap"));
        assert_eq!(app.bootstrap_class(), Some(DEFAULT_BOOTSTRAP_CLASS));
    }

    #[test]
    fn bootstrap_tree_with_class() {
        let app = app(r#"{"bootstrap": {"path": "app/boot", "class": "AppBoot"}}"#).unwrap();
        assert_eq!(app.bootstrap_path(), Some("app/boot"));
        assert_eq!(app.bootstrap_class(), Some("AppBoot"));
    }

    #[test]
    fn bootstrap_tree_without_path_fails() {
        let err = app(r#"{"bootstrap": {"class": "AppBoot"}}"#).unwrap_err();
        assert!(matches!(err, BootstrapError::Configuration(ref m) if m == "No bootstrap path provided"));
    }

    #[test]
    fn bootstrap_of_wrong_kind_fails() {
        assert!(matches!(
            app(r#"{"bootstrap": 12}"#),
            Err(BootstrapError::Configuration(_))
        ));
    }

    #[test]
    fn merge_options_deep_merges() {
        let mut app = app(r#"{"db": {"host": "a"}}"#).unwrap();
        app.merge_options(&OptionTree::from_json_str(r#"{"db": {"port": 5}, "x": 1}"#).unwrap())
            .unwrap();

        let db = app.option("db").and_then(OptionValue::as_tree).unwrap();
        assert_eq!(db.len(), 2);
        assert!(app.has_option("x"));
    }

    #[test]
    fn merge_options_ignores_key_case() {
        let mut app = app(r#"{"Resources": {"View": {"encoding": "utf-8"}}}"#).unwrap();
        app.merge_options(
            &OptionTree::from_json_str(r#"{"resources": {"view": {"doctype": "html5"}}}"#)
                .unwrap(),
        )
        .unwrap();

        let view = app
            .option("resources")
            .and_then(OptionValue::as_tree)
            .and_then(|r| r.get("view"))
            .and_then(OptionValue::as_tree)
            .unwrap();
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn bootstrap_is_created_once() {
        let mut app = app(r#"{"resources": {"view": null}}"#).unwrap();
        app.bootstrap().unwrap().container_mut().set("marker", 1_u8);
        assert!(app.bootstrap().unwrap().has_resource("marker"));
        assert_eq!(app.bootstrap().unwrap().environment(), "testing");
    }

    #[test]
    fn custom_bootstrap_replaces_default() {
        let mut app = app("{}").unwrap();
        let custom = Bootstrap::builder()
            .class_resource("hello", |_| Ok(None))
            .build(&app)
            .unwrap();
        app.with_bootstrap(custom);
        app.bootstrap_resources("hello").unwrap();
        assert!(app.bootstrap().unwrap().is_run("hello"));
    }
}
