//! Configuration loader implementation

use crate::schema::Config;
use crate::validation::ConfigValidator;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::path::Path;
use types::{ConfigError, SplitterError};

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        // Check if config file exists
        if !config_path.exists() {
            return Err(SplitterError::from(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            })
            .into());
        }

        let config: Config = Figment::new()
            // Start with YAML file
            .merge(Yaml::file(config_path))
            // Override with environment variables, e.g. PAYOUT_SPLITTER_SERVER__PORT
            .merge(Env::prefixed("PAYOUT_SPLITTER_").split("__"))
            // Also support unprefixed environment variables for common settings
            .merge(Env::raw().filter_map(|key| {
                let key = key.as_str();
                if key.eq_ignore_ascii_case("DATABASE_URL") {
                    Some("database.url".into())
                } else if key.eq_ignore_ascii_case("HTTP_HOST") {
                    Some("server.host".into())
                } else if key.eq_ignore_ascii_case("HTTP_PORT") {
                    Some("server.port".into())
                } else {
                    None
                }
            }))
            .extract()
            .context("Failed to parse configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Reject configurations with validation errors; warnings are left to the caller
    fn validate(config: &Config) -> Result<()> {
        let report = ConfigValidator::validate(config);
        if let Some(issue) = report.errors.first() {
            return Err(SplitterError::from(ConfigError::ValidationError {
                field: issue.field.clone(),
                message: issue.message.clone(),
            })
            .into());
        }
        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_default_config() {
        let config = ConfigLoader::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gateway.asset, "NEAR");
        assert!(config.export.enabled);
    }

    #[test]
    fn test_load_from_string() {
        let yaml_content = r#"
wallets:
  collection: "collector.testnet"
  owner_1: "alice.testnet"
  owner_2: "bob.testnet"
admins: [1001, 1002]
gateway:
  base_url: "https://wallet.example.com"
  timeout_seconds: 10
export:
  csv_path: "out/tx.csv"
"#;

        let config = ConfigLoader::load_from_str(yaml_content).unwrap();
        assert_eq!(config.wallets.owner_1, "alice.testnet");
        assert_eq!(config.admins, vec![1001, 1002]);
        assert_eq!(config.gateway.timeout_seconds, 10);
        assert_eq!(config.export.csv_path, "out/tx.csv");
        assert_eq!(config.export.journal_path, "data/transactions.jsonl");
        assert_eq!(config.database.url, "sqlite:data/payout_splitter.db");
    }

    #[test]
    fn test_validation_errors() {
        // Missing wallets section
        let result = ConfigLoader::load_from_str("admins: [1]\n");
        assert!(result.is_err());

        // Zero gateway timeout
        let yaml_content = r#"
wallets:
  collection: "collector.testnet"
  owner_1: "alice.testnet"
  owner_2: "bob.testnet"
gateway:
  timeout_seconds: 0
"#;
        let result = ConfigLoader::load_from_str(yaml_content);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load("/definitely/not/here/config.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_create_example() {
        let temp_file = NamedTempFile::new().unwrap();
        let result = ConfigLoader::create_example(temp_file.path());
        assert!(result.is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("wallets:"));
        assert!(content.contains("gateway:"));

        let config = ConfigLoader::load_from_str(&content).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
