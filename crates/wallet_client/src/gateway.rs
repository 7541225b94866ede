//! Payment gateway interface

use async_trait::async_trait;
use types::Result;

/// Wallet operations needed to settle a payout
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether at least `amount` has arrived at `address`. Has no side effects.
    async fn check_tokens_received(&self, address: &str, amount: f64) -> Result<bool>;

    /// Send `amount` to `address`
    async fn send_tokens(&self, amount: f64, address: &str) -> Result<()>;

    /// Get the name of the gateway
    fn name(&self) -> &str;
}
