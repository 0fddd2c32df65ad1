//! # Node Configuration
//!
//! Runtime parameters loaded from a JSON file. Consensus constants are not
//! configurable; they live in `shared-types` because every node must agree
//! on them.

use serde::{Deserialize, Serialize};
use shared_types::Peer;
use std::path::Path;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unix timestamp (seconds) of the genesis slot. Slot arithmetic for
    /// the whole chain is anchored here.
    pub genesis_timestamp: u64,

    /// Delegates registered in the genesis block.
    #[serde(default)]
    pub genesis_delegates: Vec<GenesisDelegate>,

    /// Secret phrases for the delegates this node forges for. Empty on a
    /// relay-only node.
    #[serde(default)]
    pub forging_secrets: Vec<String>,

    /// Known peers to seed the peer table with.
    #[serde(default)]
    pub peers: Vec<PeerConfig>,

    /// Force full chain verification at bootstrap even when persisted
    /// account state looks consistent.
    #[serde(default)]
    pub verify_on_load: bool,

    /// Log filter directive, e.g. `info` or `dc_02_rounds=debug`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// A delegate registered at genesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisDelegate {
    /// Registered username.
    pub username: String,
    /// Hex-encoded 32-byte public key.
    pub public_key: String,
}

/// A peer address entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Dotted-quad IPv4 address.
    pub ip: String,
    /// TCP port.
    pub port: u16,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            genesis_timestamp: 0,
            genesis_delegates: Vec::new(),
            forging_secrets: Vec::new(),
            peers: Vec::new(),
            verify_on_load: false,
            log_filter: default_log_filter(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        let config: NodeConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot start from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for delegate in &self.genesis_delegates {
            if parse_public_key(&delegate.public_key).is_none() {
                return Err(ConfigError::InvalidPublicKey(delegate.username.clone()));
            }
        }
        for peer in &self.peers {
            if peer.ip.parse::<std::net::Ipv4Addr>().is_err() {
                return Err(ConfigError::InvalidPeerAddress(peer.ip.clone()));
            }
        }
        Ok(())
    }

    /// Parsed genesis delegate keys, in file order.
    pub fn genesis_delegate_keys(&self) -> Vec<(String, [u8; 32])> {
        self.genesis_delegates
            .iter()
            .filter_map(|d| parse_public_key(&d.public_key).map(|pk| (d.username.clone(), pk)))
            .collect()
    }

    /// Configured peers as wire entities.
    pub fn peer_list(&self) -> Vec<Peer> {
        self.peers
            .iter()
            .filter_map(|p| {
                p.ip.parse::<std::net::Ipv4Addr>().ok().map(|addr| Peer {
                    ip: u32::from(addr),
                    port: p.port,
                })
            })
            .collect()
    }
}

fn parse_public_key(hex_key: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(hex_key).ok()?;
    bytes.try_into().ok()
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Can't read config file {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Genesis delegate '{0}' has an invalid public key")]
    InvalidPublicKey(String),

    #[error("Invalid peer address: {0}")]
    InvalidPeerAddress(String),
}
