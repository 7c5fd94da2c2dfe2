//! Scribe configuration system.
//!
//! TOML-based configuration for the guest editor bridge: where the guest
//! admin lives, how patient the liveness watchdog is, and where the gateway
//! listens. All sections use serde defaults so partial configs work.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ScribeConfig, CONFIG_SCHEMA_VERSION};
pub use toml_loader::{default_config_path, load_from_path};

use scribe_common::ConfigError;

/// Load config from the platform default path and validate it.
///
/// Creates a commented default file on first run.
pub fn load_config() -> Result<ScribeConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}
