//! Ledger record types

use crate::{worker::WorkerId, SplitterError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status written for a payout whose fee arrived and was split
pub const STATUS_COMPLETED: &str = "completed";

/// Status of a payout recorded before its owner transfers ran
pub const STATUS_SETTLING: &str = "settling";

/// Prefix of the status written when an owner transfer failed
pub const STATUS_PAYOUT_FAILED: &str = "payout_failed";

/// Final status of a settled payout, naming the owners left unpaid,
/// e.g. `payout_failed:owner2`
pub fn payout_status(unpaid: &[Owner]) -> String {
    if unpaid.is_empty() {
        return STATUS_COMPLETED.to_string();
    }

    let owners: Vec<&str> = unpaid.iter().map(Owner::as_str).collect();
    format!("{}:{}", STATUS_PAYOUT_FAILED, owners.join(","))
}

/// One of the two owners sharing the fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    #[serde(rename = "owner1")]
    One,
    #[serde(rename = "owner2")]
    Two,
}

impl Owner {
    /// Convert owner to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Owner::One => "owner1",
            Owner::Two => "owner2",
        }
    }

    /// Both owner slots, in order
    pub fn all() -> [Owner; 2] {
        [Owner::One, Owner::Two]
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Owner {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner1" | "1" => Ok(Owner::One),
            "owner2" | "2" => Ok(Owner::Two),
            _ => Err(SplitterError::Validation(format!("Unknown owner: {}", s))),
        }
    }
}

/// A transaction to be appended to the ledger.
///
/// These are also exactly the fields handed to the export sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub worker_id: WorkerId,
    pub withdraw_amount: f64,
    pub fee_amount: f64,
    pub owner_1_received: f64,
    pub owner_2_received: f64,
    pub status: String,
    pub screenshot_reference: String,
}

/// A recorded ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned, strictly increasing
    pub id: i64,
    pub worker_id: WorkerId,
    pub withdraw_amount: f64,
    pub fee_amount: f64,
    pub owner_1_received: f64,
    pub owner_2_received: f64,
    pub status: String,
    pub screenshot_reference: String,
    /// Whether the first owner has claimed this record's share
    pub owner_1_withdrawn: bool,
    /// Whether the second owner has claimed this record's share
    pub owner_2_withdrawn: bool,
    /// Local creation time, second precision
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    /// Amount credited to the given owner by this record
    pub fn received_by(&self, owner: Owner) -> f64 {
        match owner {
            Owner::One => self.owner_1_received,
            Owner::Two => self.owner_2_received,
        }
    }

    /// Whether the given owner has already withdrawn this record's share
    pub fn withdrawn_by(&self, owner: Owner) -> bool {
        match owner {
            Owner::One => self.owner_1_withdrawn,
            Owner::Two => self.owner_2_withdrawn,
        }
    }
}

/// Pending (not yet withdrawn) totals for both owners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingBalances {
    pub owner_1: f64,
    pub owner_2: f64,
}
