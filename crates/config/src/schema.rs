//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use types::WorkerId;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Collection and owner payout wallets
    pub wallets: WalletsConfig,
    /// User ids allowed to use admin operations, seeded at startup
    #[serde(default)]
    pub admins: Vec<WorkerId>,
    /// Wallet service configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Transaction export configuration
    #[serde(default)]
    pub export: ExportConfig,
    /// Open quote handling
    #[serde(default)]
    pub quotes: QuotesConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wallet addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletsConfig {
    /// Wallet workers pay the fee into
    pub collection: String,
    /// Payout wallet of the first owner
    pub owner_1: String,
    /// Payout wallet of the second owner
    pub owner_2: String,
}

/// Wallet service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the wallet service
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Asset the fee is paid in, shown to workers
    #[serde(default = "default_asset")]
    pub asset: String,
}

/// Transaction export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Enable export sinks
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// CSV file receiving one row per transaction
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    /// JSON-lines journal receiving one object per transaction
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
}

/// Open quote handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotesConfig {
    /// Seconds an unconfirmed quote stays open
    #[serde(default = "default_quote_ttl")]
    pub ttl_seconds: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds. A confirmation makes up to three wallet
    /// service calls, so this should exceed three gateway timeouts.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    /// Enable WAL mode for SQLite
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Enable request logging
    #[serde(default = "default_true")]
    pub request_logging: bool,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:7070".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_asset() -> String {
    "NEAR".to_string()
}

fn default_csv_path() -> String {
    "data/transactions.csv".to_string()
}

fn default_journal_path() -> String {
    "data/transactions.jsonl".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    120
}

fn default_quote_ttl() -> u64 {
    60 * 60
}

fn default_max_body_size() -> usize {
    64 * 1024 // 64KB
}

fn default_database_url() -> String {
    "sqlite:data/payout_splitter.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wallets: WalletsConfig {
                collection: "collector.near".to_string(),
                owner_1: "owner-one.near".to_string(),
                owner_2: "owner-two.near".to_string(),
            },
            admins: Vec::new(),
            gateway: GatewayConfig::default(),
            export: ExportConfig::default(),
            quotes: QuotesConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            timeout_seconds: default_timeout_seconds(),
            asset: default_asset(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            csv_path: default_csv_path(),
            journal_path: default_journal_path(),
        }
    }
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_quote_ttl(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_size: default_max_body_size(),
            cors_enabled: default_true(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout_seconds: default_connection_timeout(),
            wal_mode: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            request_logging: default_true(),
        }
    }
}
