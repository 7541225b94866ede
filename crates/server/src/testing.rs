//! Shared fixtures for the service and route tests

use crate::app::AppState;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use config::Config;
use ledger::{Database, LedgerStore, SqliteLedgerStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use types::{GatewayError, ManualClock, Result};
use wallet_client::PaymentGateway;

pub const ADMIN_ID: i64 = 900;

/// In-process wallet service double
#[derive(Debug, Default)]
pub struct FakeGateway {
    received: Mutex<bool>,
    fail_checks: Mutex<bool>,
    fail_sends: Mutex<Vec<String>>,
    send_delay: Mutex<Option<(String, Duration)>>,
    checks: Mutex<Vec<(String, f64)>>,
    sent: Mutex<Vec<(String, f64)>>,
}

impl FakeGateway {
    pub fn set_received(&self, received: bool) {
        *self.received.lock().unwrap() = received;
    }

    pub fn set_fail_checks(&self, fail: bool) {
        *self.fail_checks.lock().unwrap() = fail;
    }

    /// Reject every transfer to `address`
    pub fn fail_sends_to(&self, address: &str) {
        self.fail_sends.lock().unwrap().push(address.to_string());
    }

    /// Hold transfers to `address` for `delay` before completing them
    pub fn delay_sends_to(&self, address: &str, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some((address.to_string(), delay));
    }

    pub fn checks(&self) -> Vec<(String, f64)> {
        self.checks.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(String, f64)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn check_tokens_received(&self, address: &str, amount: f64) -> Result<bool> {
        self.checks.lock().unwrap().push((address.to_string(), amount));
        if *self.fail_checks.lock().unwrap() {
            return Err(GatewayError::ConnectionTimeout {
                service: "fake".to_string(),
            }
            .into());
        }
        Ok(*self.received.lock().unwrap())
    }

    async fn send_tokens(&self, amount: f64, address: &str) -> Result<()> {
        let delay = match &*self.send_delay.lock().unwrap() {
            Some((target, delay)) if target == address => Some(*delay),
            _ => None,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_sends.lock().unwrap().iter().any(|a| a == address) {
            return Err(GatewayError::HttpError {
                service: "fake".to_string(),
                status: 500,
            }
            .into());
        }
        self.sent.lock().unwrap().push((address.to_string(), amount));
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub struct Fixture {
    pub state: Arc<AppState>,
    pub store: Arc<SqliteLedgerStore>,
    pub gateway: Arc<FakeGateway>,
    pub clock: Arc<ManualClock>,
}

/// Application state over an in-memory ledger with one seeded admin
pub async fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(start()));
    let database = Database::new_in_memory().await.unwrap();
    let store = Arc::new(SqliteLedgerStore::new(database).with_clock(clock.clone()));
    store.seed_admins(&[ADMIN_ID]).await.unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let ledger: Arc<dyn LedgerStore> = store.clone();
    let state = Arc::new(AppState::new(
        Config::default(),
        ledger,
        gateway.clone(),
        clock.clone(),
    ));

    Fixture {
        state,
        store,
        gateway,
        clock,
    }
}
