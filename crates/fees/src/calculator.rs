//! Fee calculation engine

use crate::quota::{
    days_elapsed, required_amount, QUOTA_MET_PERCENTAGE, QUOTA_MISSED_PERCENTAGE,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use types::WorkerConfig;

/// Fee owed for one withdrawal and its split between the owners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Percentage applied to the withdrawal
    pub effective_percentage: f64,
    /// Withdrawal amount the fee was computed from
    pub withdraw_amount: f64,
    /// Fee the worker pays to the collection wallet
    pub fee_amount: f64,
    /// Portion of the fee paid to the first owner
    pub owner_1_received: f64,
    /// Portion of the fee paid to the second owner
    pub owner_2_received: f64,
}

/// Fee engine. Pure: every input, including the current time, is passed in.
#[derive(Debug, Clone, Default)]
pub struct FeeEngine;

impl FeeEngine {
    /// Create a new fee engine
    pub fn new() -> Self {
        Self
    }

    /// Percentage charged on `current_withdraw_amount`.
    ///
    /// Flat-rate workers always pay `base_percentage`. Quota workers pay the
    /// discounted rate on their first withdrawal, and afterwards whenever the
    /// withdrawal covers `daily_quota` for every whole day since the last one;
    /// otherwise they pay the penalty rate. Quota mode does not consult
    /// `base_percentage`.
    pub fn effective_percentage(
        &self,
        config: &WorkerConfig,
        last_transaction: Option<NaiveDateTime>,
        current_withdraw_amount: f64,
        now: NaiveDateTime,
    ) -> f64 {
        if !config.use_quota_logic {
            return config.base_percentage;
        }

        let Some(last) = last_transaction else {
            return QUOTA_MET_PERCENTAGE;
        };

        let days = days_elapsed(last, now);
        let required = required_amount(config.daily_quota, days);

        tracing::debug!(
            worker_id = config.worker_id,
            days_elapsed = days,
            required = required,
            amount = current_withdraw_amount,
            "Evaluated withdrawal quota"
        );

        if current_withdraw_amount >= required {
            QUOTA_MET_PERCENTAGE
        } else {
            QUOTA_MISSED_PERCENTAGE
        }
    }

    /// Compute the fee for a withdrawal and split it between the owners
    pub fn quote(
        &self,
        config: &WorkerConfig,
        last_transaction: Option<NaiveDateTime>,
        withdraw_amount: f64,
        now: NaiveDateTime,
    ) -> FeeQuote {
        let effective_percentage =
            self.effective_percentage(config, last_transaction, withdraw_amount, now);
        let fee_amount = withdraw_amount * effective_percentage / 100.0;

        FeeQuote {
            effective_percentage,
            withdraw_amount,
            fee_amount,
            owner_1_received: fee_amount * config.owner_1_share,
            owner_2_received: fee_amount * config.owner_2_share,
        }
    }
}
