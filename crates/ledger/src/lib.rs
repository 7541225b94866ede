//! Transaction ledger
//!
//! Durable storage of worker fee configuration, the append-only transaction
//! history with per-owner withdrawal flags, and the admin set. Every appended
//! transaction is also forwarded to best-effort export sinks.

pub mod database;
pub mod export;
pub mod store;

pub use database::Database;
pub use export::*;
pub use store::*;
