//! Configuration management for the property store.
//!
//! Settings are layered: compiled defaults, then an optional file, then
//! `PROPSTORE__SECTION__KEY` environment variables.
//!
//! # Example
//!
//! ```
//! use propstore::infrastructure::config::Settings;
//!
//! let settings = Settings::new().expect("Failed to load configuration");
//! assert_eq!(settings.properties.prefix, "com.palm.properties.");
//! ```

pub mod properties;
pub mod store;
pub mod telemetry;

pub use properties::PropertySettings;
pub use store::StoreSettings;
pub use telemetry::TelemetrySettings;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Preference store settings.
    #[serde(default)]
    pub store: StoreSettings,
    /// System property source settings.
    #[serde(default)]
    pub properties: PropertySettings,
    /// Logging settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads settings from defaults and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Loads settings from defaults, an optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `file` is given but unreadable, or if the merged
    /// configuration cannot be deserialized.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("telemetry.log_level", telemetry::default_log_level())?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            .add_source(
                Environment::with_prefix("PROPSTORE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
