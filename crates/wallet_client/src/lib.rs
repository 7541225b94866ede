//! Wallet service client
//!
//! This crate talks to the wallet service that holds the collection wallet:
//! polling whether a worker's fee has arrived and paying out owner shares.

pub mod client;
pub mod gateway;

pub use client::*;
pub use gateway::*;
