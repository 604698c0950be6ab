//! # Kindle Internal Library
//!
//! Re-exports the core Kindle crates for convenience.

/// The resource bootstrap engine.
pub use kindle_system;

/// Tracing and front controller resources.
pub use kindle_core_resources;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use kindle_core_resources::{
        FrontController, FrontControllerResource, TracingConfig, TracingFormat, TracingResource,
        default_loader, install,
    };
    pub use kindle_system::prelude::*;
}
