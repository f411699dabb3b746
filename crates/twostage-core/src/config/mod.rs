//! Configuration schemas.
//!
//! Configuration is read from an optional TOML file and overlaid with
//! environment variables prefixed with `TWOSTAGE__` via the `config` crate.
//! Every field has a default, so an empty source set yields a usable config.

pub mod logging;
pub mod teardown;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::teardown::TeardownConfig;

use crate::error::LifecycleError;
use crate::result::LifecycleResult;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Teardown settings applied to wrappers built from this config.
    #[serde(default)]
    pub teardown: TeardownConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifecycleConfig {
    /// Load configuration from a TOML file and the process environment.
    ///
    /// A missing file is not an error; environment variables such as
    /// `TWOSTAGE__TEARDOWN__TRACE_HOOKS=true` override file values.
    pub fn load(path: impl AsRef<Path>) -> LifecycleResult<Self> {
        Self::load_with_env(path, environment())
    }

    /// Load configuration from a TOML file and an explicit environment source.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: config::Environment,
    ) -> LifecycleResult<Self> {
        let path = path.as_ref();
        let name = path.to_str().ok_or_else(|| {
            LifecycleError::configuration(format!(
                "Config path is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        let config = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(env)
            .build()
            .map_err(|e| LifecycleError::configuration(format!("Failed to build config: {e}")))?;

        config.try_deserialize().map_err(|e| {
            LifecycleError::configuration(format!("Failed to deserialize config: {e}"))
        })
    }
}

/// The default environment overlay: `TWOSTAGE__SECTION__KEY`.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("TWOSTAGE")
        .separator("__")
        .try_parsing(true)
}
