//! Node configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

/// Chain RPC and administrative bypass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint for balance queries
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// $BOOK token contract address; empty string enables mock mode
    /// (no on-chain lookups, oracle reads degrade to zero)
    #[serde(default)]
    pub token_contract: String,

    /// ERC-20 decimals used to scale raw balances down to whole tokens
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,

    /// Administrative bypass wallets, matched case-insensitively.
    /// These skip address validation and the RPC call entirely and
    /// always read as well above threshold.
    #[serde(default = "default_admin_wallets")]
    pub admin_wallets: Vec<String>,
}

/// Eligibility and consensus calibration constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Minimum effective $BOOK balance for an agent to be active
    #[serde(default = "default_balance_threshold")]
    pub balance_threshold: i64,

    /// Standard-deviation divisor for the consensus decay curve.
    /// Half the nominal 0-100 score range in the shipped deployment.
    #[serde(default = "default_consensus_divisor")]
    pub consensus_divisor: f64,
}

// Defaults
fn default_bind() -> String { "0.0.0.0".to_string() }
fn default_http_port() -> u16 { 8080 }
fn default_db_path() -> PathBuf { PathBuf::from("buidlbook.db") }
fn default_rpc_url() -> String { "https://testnet-rpc.monad.xyz".to_string() }
fn default_token_decimals() -> u32 { 18 }
fn default_admin_wallets() -> Vec<String> { vec!["0xadmin".to_string()] }
fn default_balance_threshold() -> i64 { 10_000 }
fn default_consensus_divisor() -> f64 { 50.0 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            http_port: default_http_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            token_contract: String::new(),
            token_decimals: default_token_decimals(),
            admin_wallets: default_admin_wallets(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            balance_threshold: default_balance_threshold(),
            consensus_divisor: default_consensus_divisor(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            chain: ChainConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}
