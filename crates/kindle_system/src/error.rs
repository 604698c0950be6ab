//! Error types for bootstrapping.

/// Boxed error reported by a resource about its own initialization.
pub type BoxedError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors that can occur while configuring or running a bootstrap.
///
/// Every variant aborts the current [`run()`](crate::bootstrap::Bootstrap::run)
/// call. Resources that completed before the failure keep their container
/// entries.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Malformed registration or option input.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `run()` was given something other than nothing, a name, or a list of names.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A resource re-requested itself while its initialization was in progress.
    #[error("circular resource dependency detected at '{name}'")]
    CircularDependency {
        /// The resource that was requested while still in progress.
        name: String,
    },

    /// No class resource or registered plugin resource matches the name.
    #[error("resource matching '{name}' not found")]
    ResourceNotFound {
        /// The requested resource name, as given by the caller.
        name: String,
    },

    /// A resource failed for reasons of its own.
    #[error("resource '{name}' failed to initialize: {source}")]
    Init {
        /// The resource whose initializer failed.
        name: String,
        /// The underlying failure.
        #[source]
        source: BoxedError,
    },
}

impl BootstrapError {
    /// Creates a [`Configuration`](Self::Configuration) error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an [`InvalidArgument`](Self::InvalidArgument) error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a [`CircularDependency`](Self::CircularDependency) error.
    pub fn circular(name: impl Into<String>) -> Self {
        Self::CircularDependency { name: name.into() }
    }

    /// Creates a [`ResourceNotFound`](Self::ResourceNotFound) error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ResourceNotFound { name: name.into() }
    }

    /// Creates an [`Init`](Self::Init) error wrapping a resource's own failure.
    pub fn init(name: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self::Init {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Result alias used throughout the bootstrap engine.
pub type Result<T, E = BootstrapError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            BootstrapError::circular("db").to_string(),
            "circular resource dependency detected at 'db'"
        );
        assert_eq!(
            BootstrapError::not_found("doesNotExist").to_string(),
            "resource matching 'doesNotExist' not found"
        );
    }

    #[test]
    fn init_keeps_source() {
        let err = BootstrapError::init("cache", "disk full");
        let source = core::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
