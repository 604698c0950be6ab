//! Core resources for Kindle bootstraps.
//!
//! This crate provides plugin resources most applications need:
//!
//! - [`TracingResource`] - Logging and observability via the `tracing` crate
//! - [`FrontControllerResource`] - Front controller settings
//!
//! Both live under the default loader prefix, so they are registered by
//! short name (`tracing`, `frontcontroller`) once made loadable.
//!
//! # Example
//!
//! ```
//! use kindle_system::prelude::*;
//! use kindle_core_resources::FrontController;
//!
//! let options = OptionTree::from_json_str(
//!     r#"{"resources": {"frontController": {"controllerDirectory": "app/controllers"}}}"#,
//! )
//! .unwrap();
//! let app = Application::new("production", options).unwrap();
//! let mut bootstrap = Bootstrap::builder()
//!     .loader(kindle_core_resources::default_loader())
//!     .build(&app)
//!     .unwrap();
//!
//! bootstrap.run_all().unwrap();
//!
//! let front = bootstrap.resource_as::<FrontController>("FrontController").unwrap();
//! assert_eq!(front.controller_directory("default"), Some("app/controllers"));
//! ```

mod front_controller;
mod tracing_resource;

pub use front_controller::{
    DEFAULT_MODULE, FrontController, FrontControllerPlugin, FrontControllerResource,
};
pub use tracing_resource::{TracingConfig, TracingFormat, TracingResource};

use kindle_system::bootstrap::Bootstrap;
use kindle_system::loader::{DEFAULT_PATH, PluginLoader};
use kindle_system::resource::factory;
use std::sync::Arc;

/// Makes the core resources loadable through `loader`'s default path.
pub fn provide_core_resources(loader: &mut PluginLoader) -> &mut PluginLoader {
    loader
        .provide(
            DEFAULT_PATH,
            TracingResource::TYPE_NAME,
            factory(|opts| Ok(Arc::new(TracingResource::from_options(opts.options)?))),
        )
        .provide(
            DEFAULT_PATH,
            FrontControllerResource::TYPE_NAME,
            factory(|opts| Ok(Arc::new(FrontControllerResource::new(opts.options)))),
        )
}

/// Returns a loader with the default prefix pair and the core resources.
#[must_use]
pub fn default_loader() -> PluginLoader {
    let mut loader = PluginLoader::new();
    provide_core_resources(&mut loader);
    loader
}

/// Makes the core resources loadable by an existing engine, keeping its
/// search pairs.
pub fn install(bootstrap: &mut Bootstrap) {
    provide_core_resources(bootstrap.loader_mut());
}
