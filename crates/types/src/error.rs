//! Error types for the payout splitter

use thiserror::Error;

/// Main error type for the payout splitter
#[derive(Error, Debug)]
pub enum SplitterError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed amount, identifier or owner name supplied by a caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backing storage is unreachable or a query failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The fee has not arrived at the collection wallet yet.
    ///
    /// This is a normal negative result, the caller asks again later.
    #[error("Payment of {amount} to {address} not yet received")]
    PaymentNotYetReceived { address: String, amount: f64 },

    /// Wallet service errors
    #[error("Payment gateway error: {service}: {message}")]
    PaymentGateway { service: String, message: String },

    /// Export sink errors
    #[error("Export error: {0}")]
    Export(String),

    /// Caller is not allowed to perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The resource is busy with another request
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Not found errors
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for payout splitter operations
pub type Result<T> = std::result::Result<T, SplitterError>;

/// Ledger storage specific errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Connection failed
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be decoded
    #[error("Corrupt record in {table}: {message}")]
    CorruptRecord { table: String, message: String },
}

/// Export sink specific errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// File could not be opened or written
    #[error("Export I/O failed for {path}: {message}")]
    Io { path: String, message: String },

    /// Record could not be encoded
    #[error("Export encoding failed: {0}")]
    Encoding(String),
}

/// Wallet service specific errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Connection timeout
    #[error("Connection timeout to wallet service: {service}")]
    ConnectionTimeout { service: String },

    /// HTTP error
    #[error("HTTP error from wallet service {service}: {status}")]
    HttpError { service: String, status: u16 },

    /// Invalid response format
    #[error("Invalid response format from wallet service {service}: {message}")]
    InvalidResponse { service: String, message: String },
}

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },
}

// Conversion implementations for common error types

impl From<LedgerError> for SplitterError {
    fn from(err: LedgerError) -> Self {
        SplitterError::StoreUnavailable(err.to_string())
    }
}

impl From<ExportError> for SplitterError {
    fn from(err: ExportError) -> Self {
        SplitterError::Export(err.to_string())
    }
}

impl From<GatewayError> for SplitterError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ConnectionTimeout { service } => SplitterError::PaymentGateway {
                service,
                message: "Connection timeout".to_string(),
            },
            GatewayError::HttpError { service, status } => SplitterError::PaymentGateway {
                service,
                message: format!("HTTP error: {}", status),
            },
            GatewayError::InvalidResponse { service, message } => {
                SplitterError::PaymentGateway { service, message }
            }
        }
    }
}

impl From<ConfigError> for SplitterError {
    fn from(err: ConfigError) -> Self {
        SplitterError::Config(err.to_string())
    }
}
