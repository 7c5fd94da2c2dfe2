//! Configuration schema types for Scribe.
//!
//! All structs use `serde(default)` so partial configs work correctly.

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScribeConfig {
    pub guest: GuestConfig,
    pub liveness: LivenessConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

/// The guest editor frame: where it lives and how it authenticates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestConfig {
    /// Full URL of the guest admin page loaded into the frame. Inbound
    /// message origins are prefix-checked against this URL.
    pub admin_url: String,
    /// Name of the transient one-time auth query parameter, stripped from
    /// the URL before any fallback navigation.
    pub auth_param: String,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            admin_url: "https://example.wordpress.com/wp-admin/post-new.php".into(),
            auth_param: "frame-nonce".into(),
        }
    }
}

/// Liveness watchdog deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Stage-1 deadline in milliseconds: from mount until the guest either
    /// finishes downloading or proves itself interactive.
    pub stage1_timeout_ms: u64,
    /// Stage-2 deadline in milliseconds: from frame load (bytes downloaded)
    /// until the guest posts its bootstrap action.
    pub stage2_timeout_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            stage1_timeout_ms: 25_000,
            stage2_timeout_ms: 6_000,
        }
    }
}

/// Gateway listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
    /// Origin the host shell reports to guests asking where they are
    /// embedded.
    pub host_origin: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8390,
            host_origin: "https://app.scribe.test".into(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}
