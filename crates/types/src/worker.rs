//! Worker configuration types

use serde::{Deserialize, Serialize};

/// Worker identifier (chat user id)
pub type WorkerId = i64;

/// Default fee rate in percent
pub const DEFAULT_BASE_PERCENTAGE: f64 = 30.0;
/// Default share of the fee paid to the first owner
pub const DEFAULT_OWNER_1_SHARE: f64 = 0.5;
/// Default share of the fee paid to the second owner
pub const DEFAULT_OWNER_2_SHARE: f64 = 0.5;
/// Default daily quota used by tiered-rate mode
pub const DEFAULT_DAILY_QUOTA: f64 = 13.0;

/// Per-worker fee configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker identifier
    pub worker_id: WorkerId,
    /// Fee rate in percent used in flat-rate mode
    pub base_percentage: f64,
    /// Fraction of the fee paid to the first owner
    pub owner_1_share: f64,
    /// Fraction of the fee paid to the second owner
    pub owner_2_share: f64,
    /// Whether the tiered quota rates apply instead of `base_percentage`
    pub use_quota_logic: bool,
    /// Amount expected per elapsed day to earn the discounted rate
    pub daily_quota: f64,
}

impl WorkerConfig {
    /// Configuration assigned to a worker seen for the first time
    pub fn with_defaults(worker_id: WorkerId) -> Self {
        Self {
            worker_id,
            base_percentage: DEFAULT_BASE_PERCENTAGE,
            owner_1_share: DEFAULT_OWNER_1_SHARE,
            owner_2_share: DEFAULT_OWNER_2_SHARE,
            use_quota_logic: false,
            daily_quota: DEFAULT_DAILY_QUOTA,
        }
    }

    /// Sum of both owner shares; not required to be 1.0
    pub fn total_share(&self) -> f64 {
        self.owner_1_share + self.owner_2_share
    }
}
