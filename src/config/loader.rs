//! Configuration loading from the environment.

use thiserror::Error;

use crate::config::schema::{GatewayConfig, ObservabilityConfig};

/// Environment variable holding the Solana RPC endpoint.
pub const RPC_URL_ENV_VAR: &str = "SOLANA_RPC_SERVICE_URL";

/// Environment variable overriding the HTTP bind address.
pub const BIND_ADDRESS_ENV_VAR: &str = "GATEWAY_BIND_ADDRESS";

/// Environment variable toggling the metrics endpoint.
pub const METRICS_ENABLED_ENV_VAR: &str = "GATEWAY_METRICS_ENABLED";

/// Environment variable overriding the metrics bind address.
pub const METRICS_ADDRESS_ENV_VAR: &str = "GATEWAY_METRICS_ADDRESS";

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} env var")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },
}

/// Load configuration from process environment variables.
pub fn from_env() -> Result<GatewayConfig, ConfigError> {
    from_lookup(|key| std::env::var(key).ok())
}

/// Load configuration through a variable lookup function.
pub fn from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<GatewayConfig, ConfigError> {
    let rpc_url = lookup(RPC_URL_ENV_VAR).ok_or(ConfigError::MissingVar(RPC_URL_ENV_VAR))?;
    url::Url::parse(&rpc_url).map_err(|e| ConfigError::InvalidVar {
        var: RPC_URL_ENV_VAR,
        message: e.to_string(),
    })?;

    let bind_address =
        lookup(BIND_ADDRESS_ENV_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let mut observability = ObservabilityConfig::default();
    if let Some(enabled) = lookup(METRICS_ENABLED_ENV_VAR) {
        observability.metrics_enabled = match enabled.as_str() {
            "1" | "true" => true,
            "0" | "false" => false,
            other => {
                return Err(ConfigError::InvalidVar {
                    var: METRICS_ENABLED_ENV_VAR,
                    message: format!("expected a boolean, got '{other}'"),
                })
            }
        };
    }
    if let Some(address) = lookup(METRICS_ADDRESS_ENV_VAR) {
        observability.metrics_address = address;
    }

    Ok(GatewayConfig {
        rpc_url,
        bind_address,
        request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
        observability,
    })
}
