//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration for the transfer gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Solana JSON-RPC endpoint URL. Required.
    pub rpc_url: String,

    /// Bind address for the public HTTP listener.
    pub bind_address: String,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for individual RPC round-trips in seconds.
    pub rpc_timeout_secs: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Derive the subscription endpoint from the RPC endpoint by
    /// substituting the transport scheme (`http`→`ws`, `https`→`wss`).
    ///
    /// Confirmation is poll-based in this service, so the endpoint is only
    /// logged at startup for operator visibility.
    pub fn websocket_url(&self) -> Option<String> {
        let mut url = url::Url::parse(&self.rpc_url).ok()?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            _ => return None,
        };
        url.set_scheme(scheme).ok()?;
        Some(url.to_string())
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
