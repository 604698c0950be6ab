//! Lazy, dependency-ordered resource bootstrapping for Rust applications.
//!
//! Resources are named units of initialization work. They are discovered on
//! first use, run at most once, and pull in their own dependencies by asking
//! the engine to run them first. See [`kindle_system`] for the engine and
//! [`kindle_core_resources`] for the bundled resources.

pub use kindle_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use kindle_internal::prelude::*;
}
