//! Configuration validation.
//!
//! Collects all problems into a single `ConfigError` so a bad config
//! reports everything wrong with it at once.

use scribe_common::ConfigError;
use url::Url;

use crate::schema::ScribeConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ScribeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_guest(&mut errors, config);
    validate_liveness(&mut errors, config);
    validate_gateway(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_guest(errors: &mut Vec<String>, config: &ScribeConfig) {
    match Url::parse(&config.guest.admin_url) {
        Ok(url) => {
            if url.scheme() != "https" && url.scheme() != "http" {
                errors.push(format!(
                    "guest.admin_url must be http(s), got scheme '{}'",
                    url.scheme()
                ));
            }
        }
        Err(e) => errors.push(format!("guest.admin_url is not a valid URL: {e}")),
    }

    if config.guest.auth_param.is_empty() {
        errors.push("guest.auth_param must not be empty".into());
    }
}

fn validate_liveness(errors: &mut Vec<String>, config: &ScribeConfig) {
    if config.liveness.stage1_timeout_ms == 0 {
        errors.push("liveness.stage1_timeout_ms must be > 0".into());
    }
    if config.liveness.stage2_timeout_ms == 0 {
        errors.push("liveness.stage2_timeout_ms must be > 0".into());
    }
    if config.liveness.stage2_timeout_ms > config.liveness.stage1_timeout_ms {
        errors.push("liveness.stage2_timeout_ms must not exceed stage1_timeout_ms".into());
    }
}

fn validate_gateway(errors: &mut Vec<String>, config: &ScribeConfig) {
    if config.gateway.bind.parse::<std::net::IpAddr>().is_err() {
        errors.push(format!(
            "gateway.bind is not a valid IP address: '{}'",
            config.gateway.bind
        ));
    }
    if config.gateway.port == 0 {
        errors.push("gateway.port must be > 0".into());
    }
    if Url::parse(&config.gateway.host_origin).is_err() {
        errors.push(format!(
            "gateway.host_origin is not a valid URL: '{}'",
            config.gateway.host_origin
        ));
    }
}
