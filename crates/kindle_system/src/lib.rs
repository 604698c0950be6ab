//! The resource bootstrap engine for Kindle.
//!
//! `kindle_system` initializes named application resources lazily, in
//! dependency order, exactly once each:
//!
//! - [`application`] - Application context owning the seed options
//! - [`bootstrap`] - The engine: registration, resolution and execution
//! - [`container`] - Storage for values produced by resources
//! - [`error`] - Error type shared by every operation
//! - [`loader`] - Short-name to resource-type resolution
//! - [`options`] - Case-insensitive option trees and deep merge
//! - [`resource`] - The plugin resource contract
//! - [`shared`] - Thread-safe handle around an engine
//!
//! # Example
//!
//! ```
//! use kindle_system::prelude::*;
//!
//! let app = Application::new("production", OptionTree::new()).unwrap();
//! let mut bootstrap = Bootstrap::builder()
//!     .class_resource("db", |_| Ok(Some(ResourceValue::new(String::from("pool")))))
//!     .class_resource("session", |b| {
//!         b.run("db")?;
//!         Ok(None)
//!     })
//!     .build(&app)
//!     .unwrap();
//!
//! bootstrap.run_all().unwrap();
//!
//! assert_eq!(bootstrap.run_names(), vec!["db", "session"]);
//! assert!(bootstrap.has_resource("DB"));
//! ```

/// Application context and seed options.
pub mod application;

/// The bootstrap engine.
pub mod bootstrap;

/// Container of produced values.
pub mod container;

/// Errors raised while bootstrapping.
pub mod error;

/// Plugin resource loader.
pub mod loader;

/// Option trees.
pub mod options;

/// Plugin resource contract.
pub mod resource;

/// Thread-safe engine handle.
pub mod shared;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::application::{Application, ApplicationContext};
    pub use crate::bootstrap::{Bootstrap, BootstrapBuilder, RunTarget};
    pub use crate::container::Container;
    pub use crate::error::{BootstrapError, Result};
    pub use crate::loader::PluginLoader;
    pub use crate::options::{OptionTree, OptionValue};
    pub use crate::resource::{
        InitResult, Resource, ResourceOptions, ResourceRegistration, ResourceValue, factory,
    };
    pub use crate::shared::SharedBootstrap;
}
