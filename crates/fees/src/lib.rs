//! Fee calculation
//!
//! This crate derives the effective fee percentage for a withdrawal from the
//! worker's configuration and ledger history, and splits the resulting fee
//! between the two owners.

pub mod calculator;
pub mod quota;

pub use calculator::*;
pub use quota::*;
