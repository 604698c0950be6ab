//! Front controller configuration resource.
//!
//! [`FrontControllerResource`] turns its option tree into a
//! [`FrontController`] value. Dispatching requests is left to the host; this
//! resource only collects where controllers live and how the front
//! controller should behave.
//!
//! # Options
//!
//! Keys are matched case-insensitively.
//!
//! | Key | Value |
//! |-----|-------|
//! | `controllerdirectory` | directory of the default module, or module → directory |
//! | `modulecontrollerdirectoryname` | controller sub-directory inside a module |
//! | `moduledirectory` | directory (or list of directories) holding modules |
//! | `defaultcontrollername`, `defaultaction`, `defaultmodule` | routing defaults |
//! | `baseurl` | base URL; ignored when empty |
//! | `params` | tree replacing all params |
//! | `plugins` | list of plugin type names, or trees with `class` and optional `stackindex` |
//! | `returnresponse`, `throwexceptions` | flags |
//! | `actionhelperpaths` | helper prefix → path |
//!
//! Any other key is stored as a param.

use indexmap::IndexMap;
use kindle_system::bootstrap::Bootstrap;
use kindle_system::error::{BootstrapError, Result};
use kindle_system::options::{OptionTree, OptionValue, normalize_key};
use kindle_system::resource::{InitResult, Resource, ResourceValue};

/// Module that a plain string `controllerdirectory` belongs to.
pub const DEFAULT_MODULE: &str = "default";

/// A front controller plugin to register, with its optional stack position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontControllerPlugin {
    /// Type name of the plugin.
    pub class: String,
    /// Explicit position in the plugin stack.
    pub stack_index: Option<i64>,
}

/// Front controller settings built by [`FrontControllerResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrontController {
    /// Controller directory per module.
    pub controller_directories: IndexMap<String, String>,
    /// Name of the controller directory inside each module.
    pub module_controller_directory_name: String,
    /// Directories scanned for modules.
    pub module_directories: Vec<String>,
    /// Controller used when a request names none.
    pub default_controller_name: String,
    /// Action used when a request names none.
    pub default_action: String,
    /// Module used when a request names none.
    pub default_module: String,
    /// Base URL stripped from incoming request paths.
    pub base_url: Option<String>,
    /// Free-form parameters.
    pub params: IndexMap<String, OptionValue>,
    /// Plugins in registration order.
    pub plugins: Vec<FrontControllerPlugin>,
    /// Hand the response back to the host instead of sending it.
    pub return_response: bool,
    /// Propagate dispatch errors instead of rendering them.
    pub throw_exceptions: bool,
    /// `(prefix, path)` pairs for action helpers.
    pub action_helper_paths: Vec<(String, String)>,
}

impl Default for FrontController {
    fn default() -> Self {
        Self {
            controller_directories: IndexMap::new(),
            module_controller_directory_name: "controllers".to_string(),
            module_directories: Vec::new(),
            default_controller_name: "index".to_string(),
            default_action: "index".to_string(),
            default_module: DEFAULT_MODULE.to_string(),
            base_url: None,
            params: IndexMap::new(),
            plugins: Vec::new(),
            return_response: false,
            throw_exceptions: false,
            action_helper_paths: Vec::new(),
        }
    }
}

impl FrontController {
    /// Returns the controller directory registered for `module`.
    #[must_use]
    pub fn controller_directory(&self, module: &str) -> Option<&str> {
        self.controller_directories
            .get(&normalize_key(module))
            .map(String::as_str)
    }

    /// Returns the param stored under `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&OptionValue> {
        self.params.get(name)
    }

    /// Checks that the default module has a controller directory, which a
    /// host needs before it can dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if none is registered.
    pub fn ensure_dispatchable(&self) -> Result<()> {
        match self.controller_directory(&self.default_module) {
            Some(_) => Ok(()),
            None => Err(BootstrapError::configuration(
                "No default controller directory registered with front controller",
            )),
        }
    }

    fn apply(&mut self, key: &str, value: &OptionValue) -> Result<()> {
        match normalize_key(key).as_str() {
            "controllerdirectory" => match value {
                OptionValue::String(directory) => {
                    self.controller_directories.clear();
                    self.controller_directories
                        .insert(DEFAULT_MODULE.to_string(), directory.clone());
                }
                OptionValue::Tree(modules) => {
                    for (module, directory) in modules {
                        self.controller_directories
                            .insert(normalize_key(module), string_of(key, directory)?);
                    }
                }
                other => return Err(wrong_kind(key, "a string or a tree", other)),
            },
            "modulecontrollerdirectoryname" => {
                self.module_controller_directory_name = string_of(key, value)?;
            }
            "moduledirectory" => match value {
                OptionValue::List(directories) => {
                    for directory in directories {
                        self.module_directories.push(string_of(key, directory)?);
                    }
                }
                other => self.module_directories.push(string_of(key, other)?),
            },
            "defaultcontrollername" => self.default_controller_name = string_of(key, value)?,
            "defaultaction" => self.default_action = string_of(key, value)?,
            "defaultmodule" => self.default_module = string_of(key, value)?,
            "baseurl" => {
                if value.is_truthy() {
                    self.base_url = Some(string_of(key, value)?);
                }
            }
            "params" => {
                let params = value
                    .as_tree()
                    .ok_or_else(|| wrong_kind(key, "a tree", value))?;
                self.params = params
                    .iter()
                    .map(|(name, param)| (name.to_string(), param.clone()))
                    .collect();
            }
            "plugins" => match value {
                OptionValue::List(plugins) => {
                    for plugin in plugins {
                        self.plugins.push(plugin_of(plugin)?);
                    }
                }
                other => self.plugins.push(plugin_of(other)?),
            },
            "returnresponse" => self.return_response = value.is_truthy(),
            "throwexceptions" => self.throw_exceptions = value.is_truthy(),
            "actionhelperpaths" => {
                if let Some(paths) = value.as_tree() {
                    for (prefix, path) in paths {
                        self.action_helper_paths
                            .push((prefix.to_string(), string_of(key, path)?));
                    }
                }
            }
            _ => {
                self.params.insert(key.to_string(), value.clone());
            }
        }
        Ok(())
    }
}

fn wrong_kind(key: &str, expected: &str, found: &OptionValue) -> BootstrapError {
    BootstrapError::configuration(format!(
        "front controller option '{key}' must be {expected}, found {}",
        found.kind()
    ))
}

fn string_of(key: &str, value: &OptionValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_kind(key, "a string", value))
}

fn plugin_of(value: &OptionValue) -> Result<FrontControllerPlugin> {
    match value {
        OptionValue::String(class) => Ok(FrontControllerPlugin {
            class: class.clone(),
            stack_index: None,
        }),
        OptionValue::Tree(spec) => {
            let class = spec
                .get("class")
                .and_then(OptionValue::as_str)
                .ok_or_else(|| {
                    BootstrapError::configuration("front controller plugins need a 'class'")
                })?;
            let stack_index = match spec.get("stackindex") {
                None | Some(OptionValue::Null) => None,
                Some(index) => Some(
                    index
                        .as_i64()
                        .ok_or_else(|| wrong_kind("stackindex", "an integer", index))?,
                ),
            };
            Ok(FrontControllerPlugin {
                class: class.to_string(),
                stack_index,
            })
        }
        other => Err(wrong_kind("plugins", "a list of names or trees", other)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FrontControllerResource
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a [`FrontController`] from options and stores it under the
/// resource's name.
#[derive(Debug, Clone, Default)]
pub struct FrontControllerResource {
    options: OptionTree,
}

impl FrontControllerResource {
    /// Full type name, which the default loader prefix shortens to
    /// `FrontController`.
    pub const TYPE_NAME: &'static str = "kindle::resource::FrontController";

    /// Creates the resource with `options`.
    #[must_use]
    pub fn new(options: OptionTree) -> Self {
        Self { options }
    }

    /// Builds the front controller settings without a bootstrap.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] if an option has the wrong kind.
    pub fn build(&self) -> Result<FrontController> {
        let mut front = FrontController::default();
        for (key, value) in &self.options {
            front.apply(key, value)?;
        }
        Ok(front)
    }
}

impl Resource for FrontControllerResource {
    fn init(&self, _bootstrap: &mut Bootstrap) -> InitResult {
        let front = self.build()?;
        tracing::debug!(
            modules = front.controller_directories.len(),
            plugins = front.plugins.len(),
            "front controller configured"
        );
        Ok(Some(ResourceValue::new(front)))
    }

    fn options(&self) -> &OptionTree {
        &self.options
    }

    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }
}
