//! Configuration validation utilities

use crate::schema::Config;
use std::collections::HashSet;

/// Wallet service calls made by one confirmation: the fee check and one
/// transfer per owner
const GATEWAY_CALLS_PER_CONFIRM: u64 = 3;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_wallets(config, &mut report);
        Self::validate_admins(config, &mut report);
        Self::validate_gateway(config, &mut report);
        Self::validate_export(config, &mut report);
        Self::validate_quotes(config, &mut report);
        Self::validate_server(config, &mut report);
        Self::validate_database(config, &mut report);
        Self::validate_logging(config, &mut report);

        report
    }

    fn validate_wallets(config: &Config, report: &mut ValidationReport) {
        let wallets = &config.wallets;
        for (field, address) in [
            ("wallets.collection", &wallets.collection),
            ("wallets.owner_1", &wallets.owner_1),
            ("wallets.owner_2", &wallets.owner_2),
        ] {
            if address.trim().is_empty() {
                report.add_error(field, "Wallet address cannot be empty");
            }
        }

        if wallets.collection == wallets.owner_1 || wallets.collection == wallets.owner_2 {
            report.add_warning(
                "wallets.collection",
                "Collection wallet is also an owner payout wallet",
            );
        }

        if wallets.owner_1 == wallets.owner_2 {
            report.add_warning("wallets", "Both owners are paid to the same wallet");
        }
    }

    fn validate_admins(config: &Config, report: &mut ValidationReport) {
        if config.admins.is_empty() {
            report.add_warning("admins", "No admins configured, admin endpoints are unusable");
        }

        let mut seen = HashSet::new();
        for admin in &config.admins {
            if !seen.insert(admin) {
                report.add_warning("admins", &format!("Duplicate admin id: {}", admin));
            }
        }
    }

    fn validate_gateway(config: &Config, report: &mut ValidationReport) {
        let url = &config.gateway.base_url;
        if url.is_empty() {
            report.add_error("gateway.base_url", "Wallet service URL cannot be empty");
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            report.add_error(
                "gateway.base_url",
                &format!("Invalid wallet service URL: {}", url),
            );
        } else if url.starts_with("http://") && !is_loopback_url(url) {
            report.add_warning("gateway.base_url", "Wallet service URL should use HTTPS");
        }

        if config.gateway.timeout_seconds == 0 {
            report.add_error("gateway.timeout_seconds", "Timeout cannot be 0");
        } else if config.gateway.timeout_seconds > 300 {
            report.add_warning(
                "gateway.timeout_seconds",
                &format!("Timeout is very high ({}s)", config.gateway.timeout_seconds),
            );
        }

        if config.gateway.asset.trim().is_empty() {
            report.add_error("gateway.asset", "Asset name cannot be empty");
        }
    }

    fn validate_export(config: &Config, report: &mut ValidationReport) {
        if !config.export.enabled {
            report.add_warning("export.enabled", "Transaction export is disabled");
            return;
        }

        if config.export.csv_path.is_empty() {
            report.add_error("export.csv_path", "CSV export path cannot be empty");
        }

        if config.export.journal_path.is_empty() {
            report.add_error("export.journal_path", "Journal export path cannot be empty");
        }

        if !config.export.csv_path.is_empty() && config.export.csv_path == config.export.journal_path {
            report.add_error("export", "CSV and journal exports cannot share a file");
        }
    }

    fn validate_quotes(config: &Config, report: &mut ValidationReport) {
        if config.quotes.ttl_seconds == 0 {
            report.add_error("quotes.ttl_seconds", "Quote TTL cannot be 0");
        }
    }

    fn validate_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "Server port cannot be 0");
        } else if config.server.port < 1024 {
            report.add_warning("server.port", "Server port is below 1024, may require elevated privileges");
        }

        if config.server.request_timeout_seconds == 0 {
            report.add_error("server.request_timeout_seconds", "Request timeout cannot be 0");
        } else if config.server.request_timeout_seconds
            <= GATEWAY_CALLS_PER_CONFIRM * config.gateway.timeout_seconds
        {
            report.add_warning(
                "server.request_timeout_seconds",
                &format!(
                    "Request timeout does not exceed {} wallet service timeouts",
                    GATEWAY_CALLS_PER_CONFIRM
                ),
            );
        }

        if config.server.max_body_size == 0 {
            report.add_error("server.max_body_size", "Max body size cannot be 0");
        }

        if config.server.host.is_empty() {
            report.add_error("server.host", "Server host cannot be empty");
        }
    }

    fn validate_database(config: &Config, report: &mut ValidationReport) {
        if config.database.url.is_empty() {
            report.add_error("database.url", "Database URL cannot be empty");
        } else if !config.database.url.starts_with("sqlite:") {
            report.add_error("database.url", "Only SQLite is supported");
        }

        if config.database.max_connections == 0 {
            report.add_error("database.max_connections", "Max connections cannot be 0");
        }

        if config.database.connection_timeout_seconds == 0 {
            report.add_error("database.connection_timeout_seconds", "Connection timeout cannot be 0");
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error("logging.level", &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error("logging.format", &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats));
        }
    }
}

fn is_loopback_url(url: &str) -> bool {
    let rest = url.trim_start_matches("http://");
    rest.starts_with("127.0.0.1") || rest.starts_with("localhost") || rest.starts_with("[::1]")
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let report = ConfigValidator::validate(&Config::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        // No admins in the default config
        assert!(report.warnings.iter().any(|w| w.field == "admins"));
        assert!(!report
            .warnings
            .iter()
            .any(|w| w.field == "server.request_timeout_seconds"));
    }

    #[test]
    fn test_request_timeout_must_cover_every_gateway_call() {
        let mut config = Config::default();
        config.gateway.timeout_seconds = 30;
        config.server.request_timeout_seconds = 60;

        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.field == "server.request_timeout_seconds"));

        config.server.request_timeout_seconds = 91;
        let report = ConfigValidator::validate(&config);
        assert!(!report
            .warnings
            .iter()
            .any(|w| w.field == "server.request_timeout_seconds"));
    }

    #[test]
    fn test_zero_quote_ttl_rejected() {
        let mut config = Config::default();
        config.quotes.ttl_seconds = 0;

        let report = ConfigValidator::validate(&config);
        assert!(report.errors.iter().any(|e| e.field == "quotes.ttl_seconds"));
    }

    #[test]
    fn test_empty_wallet_is_an_error() {
        let mut config = Config::default();
        config.wallets.owner_2 = "  ".to_string();
        config.admins = vec![1];

        let report = ConfigValidator::validate(&config);
        assert!(report.errors.iter().any(|e| e.field == "wallets.owner_2"));
    }

    #[test]
    fn test_non_sqlite_database_rejected() {
        let mut config = Config::default();
        config.database.url = "postgres://localhost/ledger".to_string();

        let report = ConfigValidator::validate(&config);
        assert!(!report.is_valid());
        assert_eq!(report.summary(), format!("Validation: {} errors, {} warnings", report.errors.len(), report.warnings.len()));
    }

    #[test]
    fn test_remote_plain_http_gateway_warns() {
        let mut config = Config::default();
        config.gateway.base_url = "http://wallet.internal:7070".to_string();

        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "gateway.base_url"));
    }

    #[test]
    fn test_shared_export_file_rejected() {
        let mut config = Config::default();
        config.export.journal_path = config.export.csv_path.clone();

        let report = ConfigValidator::validate(&config);
        assert!(report.errors.iter().any(|e| e.field == "export"));
    }
}
