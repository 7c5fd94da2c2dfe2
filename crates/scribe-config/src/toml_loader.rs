//! TOML config loading: read from path or platform default.

use std::path::{Path, PathBuf};

use scribe_common::ConfigError;
use tracing::info;

use crate::schema::ScribeConfig;

/// Load config from a specific TOML file path.
///
/// Missing fields are filled from serde defaults.
pub fn load_from_path(path: &Path) -> Result<ScribeConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.to_path_buf()))?;

    let config: ScribeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/scribe/config.toml`
/// On Linux: `~/.config/scribe/config.toml`
///
/// If the file does not exist, creates a commented default and returns defaults.
pub fn load_default() -> Result<ScribeConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(ScribeConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("scribe").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG_TOML: &str = r#"# Scribe configuration.
# Every key is optional; missing keys use the defaults shown here.

[guest]
# Full URL of the guest admin page loaded into the embedded frame.
admin_url = "https://example.wordpress.com/wp-admin/post-new.php"
# One-time auth query parameter, stripped before any fallback navigation.
auth_param = "frame-nonce"

[liveness]
# Deadline from mount until the frame finishes downloading (ms).
stage1_timeout_ms = 25000
# Deadline from frame load until the guest app proves itself interactive (ms).
stage2_timeout_ms = 6000

[gateway]
bind = "127.0.0.1"
port = 8390
# Origin reported to guests asking where they are embedded.
host_origin = "https://app.scribe.test"

[logging]
# Default tracing filter; RUST_LOG overrides.
filter = "info"
"#;
