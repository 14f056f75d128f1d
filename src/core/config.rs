//! Chain descriptor supplied by the host at construction.

use crate::core::domain::ChainId;
use serde::{Deserialize, Serialize};

/// A single RPC endpoint of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "EndpointConfig::default_protocol")]
    pub protocol: String,

    pub host: String,

    #[serde(default = "EndpointConfig::default_port")]
    pub port: u16,
}

impl EndpointConfig {
    fn default_protocol() -> String {
        "https".to_string()
    }

    fn default_port() -> u16 {
        443
    }

    pub fn new(protocol: &str, host: &str, port: u16) -> Self {
        Self { protocol: protocol.to_string(), host: host.to_string(), port }
    }

    /// Connection string for the RPC client.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Descriptor of the chain an account lives on: its identifier plus the
/// RPC endpoints the host has configured for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: ChainId,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl ChainConfig {
    pub fn new(chain_id: ChainId, endpoints: Vec<EndpointConfig>) -> Self {
        Self { chain_id, endpoints }
    }

    /// The adapter connects to the first configured endpoint only.
    pub fn first_endpoint(&self) -> Option<&EndpointConfig> {
        self.endpoints.first()
    }
}
