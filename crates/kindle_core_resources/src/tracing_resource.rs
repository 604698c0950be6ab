//! Tracing and observability resource.
//!
//! Provides [`TracingResource`], which installs a `tracing` subscriber when
//! bootstrapped and stores the effective [`TracingConfig`] in the container.
//!
//! # Options
//!
//! | Key | Value | Default |
//! |-----|-------|---------|
//! | `level` | `trace`, `debug`, `info`, `warn` or `error` | `info` |
//! | `format` | `pretty`, `compact` or `json` | `pretty` |
//! | `envfilter` | filter directives, e.g. `"kindle=debug,hyper=warn"` | none |
//! | `spanevents` | log span enter/exit | `false` |
//!
//! # Example
//!
//! ```
//! use kindle_system::prelude::*;
//! use kindle_core_resources::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! let options = OptionTree::from_json_str(
//!     r#"{"resources": {"tracing": {"level": "debug", "format": "compact"}}}"#,
//! )
//! .unwrap();
//! let app = Application::new("development", options).unwrap();
//! let mut bootstrap = Bootstrap::new(&app).unwrap();
//! kindle_core_resources::install(&mut bootstrap);
//!
//! bootstrap.run("tracing").unwrap();
//!
//! let config = bootstrap.resource_as::<TracingConfig>("tracing").unwrap();
//! assert_eq!(config.level, Level::DEBUG);
//! assert_eq!(config.format, TracingFormat::Compact);
//! ```

use core::str::FromStr;
use kindle_system::bootstrap::Bootstrap;
use kindle_system::error::{BootstrapError, Result};
use kindle_system::options::{OptionTree, OptionValue};
use kindle_system::resource::{InitResult, Resource, ResourceValue};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

impl FromStr for TracingFormat {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(BootstrapError::configuration(format!(
                "unknown tracing format '{other}' (expected pretty, compact or json)"
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The tracing configuration a [`TracingResource`] installed.
///
/// Stored in the container under the resource's name, so later resources can
/// adapt to the configured level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingResource
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging resource.
///
/// Configures the `tracing` subscriber when bootstrapped. Installation is
/// skipped silently if a global subscriber already exists.
#[derive(Debug, Clone)]
pub struct TracingResource {
    options: OptionTree,
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "kindle=debug,hyper=warn").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingResource {
    fn default() -> Self {
        Self {
            options: OptionTree::new(),
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingResource {
    /// Full type name, which the default loader prefix shortens to `Tracing`.
    pub const TYPE_NAME: &'static str = "kindle::resource::Tracing";

    /// Creates a `TracingResource` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from a resource option tree.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] for an unknown level or
    /// format, or an option of the wrong kind.
    pub fn from_options(options: OptionTree) -> Result<Self> {
        let mut resource = Self::default();

        if let Some(level) = options.get("level") {
            let level = expect_str("level", level)?;
            resource.level = Level::from_str(level).map_err(|_| {
                BootstrapError::configuration(format!("unknown tracing level '{level}'"))
            })?;
        }
        if let Some(format) = options.get("format") {
            resource.format = expect_str("format", format)?.parse()?;
        }
        if let Some(filter) = options.get("envfilter") {
            resource.env_filter = Some(expect_str("envfilter", filter)?.to_string());
        }
        if let Some(span_events) = options.get("spanevents") {
            resource.span_events = span_events.is_truthy();
        }

        resource.options = options;
        Ok(resource)
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configuration this resource installs.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn install_subscriber(&self) {
        let env_filter = match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        };

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() ignores an already installed subscriber
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }
    }
}

impl Resource for TracingResource {
    fn init(&self, bootstrap: &mut Bootstrap) -> InitResult {
        self.install_subscriber();

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            environment = bootstrap.environment(),
            "tracing resource initialized"
        );

        Ok(Some(ResourceValue::new(self.config())))
    }

    fn options(&self) -> &OptionTree {
        &self.options
    }

    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }
}

fn expect_str<'a>(key: &str, value: &'a OptionValue) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        BootstrapError::configuration(format!(
            "tracing option '{key}' must be a string, found {}",
            value.kind()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(json: &str) -> OptionTree {
        OptionTree::from_json_str(json).unwrap()
    }

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<TracingFormat>().unwrap(), TracingFormat::Json);
        assert_eq!("compact".parse::<TracingFormat>().unwrap(), TracingFormat::Compact);
        assert!(matches!(
            "xml".parse::<TracingFormat>(),
            Err(BootstrapError::Configuration(_))
        ));
    }

    #[test]
    fn default_level_is_info() {
        let resource = TracingResource::default();
        assert_eq!(resource.level, Level::INFO);
        assert!(!resource.span_events);
    }

    #[test]
    fn builders_set_fields() {
        let resource = TracingResource::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json)
            .with_env_filter("kindle=debug")
            .with_span_events(true);

        assert_eq!(resource.level, Level::DEBUG);
        assert_eq!(resource.format, TracingFormat::Json);
        assert_eq!(resource.env_filter, Some("kindle=debug".to_string()));
        assert!(resource.span_events);
    }

    #[test]
    fn from_options_reads_all_keys() {
        let resource = TracingResource::from_options(options(
            r#"{"Level": "warn", "format": "json", "envFilter": "kindle=trace", "spanEvents": true}"#,
        ))
        .unwrap();

        assert_eq!(resource.level, Level::WARN);
        assert_eq!(resource.format, TracingFormat::Json);
        assert_eq!(resource.env_filter.as_deref(), Some("kindle=trace"));
        assert!(resource.span_events);
        assert_eq!(resource.options().len(), 4);
    }

    #[test]
    fn from_options_rejects_bad_values() {
        for json in [
            r#"{"level": "loud"}"#,
            r#"{"level": 3}"#,
            r#"{"format": "xml"}"#,
            r#"{"envfilter": false}"#,
        ] {
            assert!(
                matches!(
                    TracingResource::from_options(options(json)),
                    Err(BootstrapError::Configuration(_))
                ),
                "expected configuration error for {json}"
            );
        }
    }
}
