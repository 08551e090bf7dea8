//! Per-worker endpoint resolution.
//!
//! The endpoint template and base port come from environment variables
//! keyed by the engine name (`OLLAMA_ENDPOINT`, `OLLAMA_PORT`). In
//! multiport mode each worker targets `base_port + worker_id`, simulating
//! independent backend instances behind distinct ports.

use crate::config::EngineKind;
use crate::providers::openai::OpenAiClient;
use thiserror::Error;

/// Errors raised while resolving an endpoint.
///
/// These are configuration preconditions shared by every worker; the
/// dispatcher surfaces them before anything is spawned.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint template variable is absent or empty.
    #[error("endpoint not set: define env \"{0}\"")]
    MissingEndpoint(String),

    /// The base port variable is absent or empty.
    #[error("port not set: define env \"{0}\"")]
    MissingPort(String),

    /// The base port variable does not parse as a port number.
    #[error("invalid port in env \"{key}\": {value:?}")]
    InvalidPort {
        /// Offending variable name.
        key: String,
        /// Raw value found in the environment.
        value: String,
    },
}

/// Validated endpoint parameters for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEndpoint {
    template: String,
    base_port: u16,
}

impl EngineEndpoint {
    /// Build from already-validated parts. The template must contain a
    /// literal `{port}` substitution point.
    pub fn new(template: impl Into<String>, base_port: u16) -> Self {
        Self {
            template: template.into(),
            base_port,
        }
    }

    /// Read and validate the endpoint configuration from the environment.
    pub fn from_env(engine: EngineKind) -> Result<Self, EndpointError> {
        let env_name = engine.name().to_uppercase();

        let url_key = format!("{env_name}_ENDPOINT");
        let template = std::env::var(&url_key)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(EndpointError::MissingEndpoint(url_key))?;

        let port_key = format!("{env_name}_PORT");
        let raw = std::env::var(&port_key)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EndpointError::MissingPort(port_key.clone()))?;
        let base_port = raw.parse().map_err(|_| EndpointError::InvalidPort {
            key: port_key,
            value: raw,
        })?;

        Ok(Self::new(template, base_port))
    }

    /// Port assigned to `worker_id` under the given fan-out mode.
    pub fn port_for(&self, worker_id: usize, multiport: bool) -> u16 {
        if multiport {
            self.base_port + worker_id as u16
        } else {
            self.base_port
        }
    }

    /// Base URL for `worker_id`, with the `{port}` placeholder substituted.
    pub fn url_for(&self, worker_id: usize, multiport: bool) -> String {
        self.template
            .replace("{port}", &self.port_for(worker_id, multiport).to_string())
    }
}

/// Build a client bound to the endpoint resolved for `worker_id`.
///
/// Pure given the environment and performs no network I/O; called once per
/// worker. The engine name is used as the bearer credential — the local
/// backend does not check it.
pub fn resolve_client(
    engine: EngineKind,
    worker_id: usize,
    multiport: bool,
) -> Result<OpenAiClient, EndpointError> {
    let endpoint = EngineEndpoint::from_env(engine)?;
    let base_url = endpoint.url_for(worker_id, multiport);
    Ok(OpenAiClient::new(base_url, engine.name().to_string()))
}
