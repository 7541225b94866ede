//! Quota tiers for workers on tiered-rate mode

use chrono::NaiveDateTime;

/// Rate charged on a worker's first withdrawal and whenever the quota is met
pub const QUOTA_MET_PERCENTAGE: f64 = 20.0;

/// Rate charged when the quota is missed
pub const QUOTA_MISSED_PERCENTAGE: f64 = 30.0;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `last` and `now`, never less than one.
///
/// A withdrawal made minutes after the previous one still counts as one
/// elapsed day, so the quota threshold is never zero.
pub fn days_elapsed(last: NaiveDateTime, now: NaiveDateTime) -> i64 {
    let seconds = (now - last).num_seconds();
    seconds.div_euclid(SECONDS_PER_DAY).max(1)
}

/// Amount a worker must withdraw to earn the discounted rate
pub fn required_amount(daily_quota: f64, days_elapsed: i64) -> f64 {
    daily_quota * days_elapsed as f64
}
