//! Shared types for the payout splitter
//!
//! This crate contains the domain types shared by the fee engine, the ledger
//! and the HTTP service: worker configuration, ledger records, owner slots,
//! the clock abstraction and the error taxonomy.

pub mod clock;
pub mod error;
pub mod ledger;
pub mod utils;
pub mod worker;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, ExportError, GatewayError, LedgerError, Result, SplitterError};
pub use ledger::*;
pub use worker::*;
