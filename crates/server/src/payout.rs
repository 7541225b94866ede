//! Payout orchestration
//!
//! A worker asks for a quote, pays the fee into the collection wallet, then
//! confirms. Confirmation checks the wallet service, records the transaction
//! in the ledger, then forwards each owner's share and stores the outcome.

use chrono::{NaiveDateTime, TimeDelta};
use config::WalletsConfig;
use fees::{FeeEngine, FeeQuote};
use ledger::LedgerStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use types::utils::{ensure_finite, ensure_positive_amount};
use types::{
    payout_status, Clock, NewTransaction, Owner, PendingBalances, Result, SplitterError,
    Transaction, WorkerConfig, WorkerId, STATUS_COMPLETED, STATUS_SETTLING,
};
use uuid::Uuid;
use wallet_client::PaymentGateway;

const SHARE_SUM_TOLERANCE: f64 = 1e-9;

/// A fee quote waiting for the worker's payment
#[derive(Debug, Clone, Serialize)]
pub struct PendingQuote {
    pub quote_id: Uuid,
    pub worker_id: WorkerId,
    #[serde(flatten)]
    pub fee: FeeQuote,
    pub screenshot_reference: String,
    /// Where the worker has to send `fee_amount`
    pub collection_wallet: String,
    pub created_at: NaiveDateTime,
}

/// Outcome of a confirmed quote
#[derive(Debug, Clone, Serialize)]
pub struct CompletedPayout {
    pub transaction_id: i64,
    #[serde(flatten)]
    pub record: NewTransaction,
}

/// Result of an owner withdrawal
#[derive(Debug, Clone, Serialize)]
pub struct OwnerReset {
    pub owner: Owner,
    pub reset_count: u64,
    pub pending: PendingBalances,
}

/// Where a quote is in its lifecycle
#[derive(Debug, Clone)]
enum QuoteState {
    Open,
    /// A confirmation owns the quote
    Settling,
    /// Kept so a repeated confirmation returns the recorded payout
    Settled(CompletedPayout),
}

#[derive(Debug)]
struct QuoteEntry {
    quote: PendingQuote,
    state: QuoteState,
}

/// Outcome of claiming a quote for confirmation
enum Claim {
    Settle(PendingQuote),
    Done(CompletedPayout),
}

/// Quotes keyed by id.
///
/// A worker holds at most one open quote, and open or settled quotes older
/// than the TTL are dropped whenever a new quote is issued.
#[derive(Debug)]
struct QuoteBook {
    entries: Mutex<HashMap<Uuid, QuoteEntry>>,
    ttl: TimeDelta,
}

impl QuoteBook {
    fn new(ttl: TimeDelta) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, QuoteEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, quote: &PendingQuote, now: NaiveDateTime) -> bool {
        now - quote.created_at >= self.ttl
    }

    /// Store a new open quote, replacing the worker's previous one
    fn open(&self, quote: PendingQuote) {
        let now = quote.created_at;
        let mut entries = self.lock();
        let before = entries.len();

        entries.retain(|_, entry| match entry.state {
            QuoteState::Settling => true,
            QuoteState::Open if entry.quote.worker_id == quote.worker_id => false,
            _ => !self.is_expired(&entry.quote, now),
        });

        let dropped = before - entries.len();
        if dropped > 0 {
            debug!(worker_id = quote.worker_id, dropped = dropped, "Dropped stale quotes");
        }

        entries.insert(
            quote.quote_id,
            QuoteEntry {
                quote,
                state: QuoteState::Open,
            },
        );
    }

    /// Hand an open quote to one confirmation at a time
    fn claim(&self, worker_id: WorkerId, quote_id: Uuid, now: NaiveDateTime) -> Result<Claim> {
        let mut entries = self.lock();
        let expired = match entries.get_mut(&quote_id) {
            Some(entry) if entry.quote.worker_id == worker_id => match entry.state {
                QuoteState::Settling => {
                    return Err(SplitterError::Conflict(format!(
                        "quote {} is already being confirmed",
                        quote_id
                    )))
                }
                QuoteState::Settled(ref payout) => return Ok(Claim::Done(payout.clone())),
                QuoteState::Open if !self.is_expired(&entry.quote, now) => {
                    entry.state = QuoteState::Settling;
                    return Ok(Claim::Settle(entry.quote.clone()));
                }
                QuoteState::Open => true,
            },
            _ => false,
        };

        if expired {
            entries.remove(&quote_id);
        }
        Err(quote_not_found(quote_id))
    }

    /// Return a settling quote to the open state
    fn reopen(&self, quote_id: Uuid) {
        if let Some(entry) = self.lock().get_mut(&quote_id) {
            entry.state = QuoteState::Open;
        }
    }

    fn settled(&self, quote_id: Uuid, payout: CompletedPayout) {
        if let Some(entry) = self.lock().get_mut(&quote_id) {
            entry.state = QuoteState::Settled(payout);
        }
    }

    fn cancel(&self, worker_id: WorkerId, quote_id: Uuid) -> Result<()> {
        let mut entries = self.lock();
        let open = match entries.get(&quote_id) {
            Some(entry) if entry.quote.worker_id == worker_id => {
                matches!(entry.state, QuoteState::Open)
            }
            _ => return Err(quote_not_found(quote_id)),
        };

        if !open {
            return Err(SplitterError::Conflict(format!(
                "quote {} is already confirmed",
                quote_id
            )));
        }
        entries.remove(&quote_id);
        Ok(())
    }

    fn open_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| matches!(entry.state, QuoteState::Open))
            .count()
    }
}

/// Coordinates the fee engine, the wallet service and the ledger
pub struct PayoutService {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    wallets: WalletsConfig,
    engine: FeeEngine,
    quotes: QuoteBook,
}

impl PayoutService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        wallets: WalletsConfig,
        quote_ttl: TimeDelta,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            wallets,
            engine: FeeEngine::new(),
            quotes: QuoteBook::new(quote_ttl),
        }
    }

    /// Price a withdrawal and hold the quote until it is confirmed or cancelled
    pub async fn quote(
        &self,
        worker_id: WorkerId,
        withdraw_amount: f64,
        screenshot_reference: String,
    ) -> Result<PendingQuote> {
        let withdraw_amount = ensure_positive_amount("withdraw_amount", withdraw_amount)?;

        let config = self.store.get_or_create_worker_config(worker_id).await?;
        let last = self.store.last_transaction_timestamp(worker_id).await?;
        let now = self.clock.now();

        let fee = self.engine.quote(&config, last, withdraw_amount, now);
        let quote = PendingQuote {
            quote_id: Uuid::new_v4(),
            worker_id,
            fee,
            screenshot_reference,
            collection_wallet: self.wallets.collection.clone(),
            created_at: now,
        };

        info!(
            worker_id = worker_id,
            quote_id = %quote.quote_id,
            withdraw_amount = withdraw_amount,
            effective_percentage = quote.fee.effective_percentage,
            fee_amount = quote.fee.fee_amount,
            "Issued fee quote"
        );

        self.quotes.open(quote.clone());
        Ok(quote)
    }

    /// Settle a quote once its fee has reached the collection wallet.
    ///
    /// While the fee is missing, or the wallet service cannot answer, the
    /// quote stays open so the worker can confirm again. Settlement runs on
    /// its own task, so a caller that goes away does not interrupt it.
    /// Confirming a settled quote again returns the recorded outcome.
    pub async fn confirm(
        self: &Arc<Self>,
        worker_id: WorkerId,
        quote_id: Uuid,
    ) -> Result<CompletedPayout> {
        let quote = match self.quotes.claim(worker_id, quote_id, self.clock.now())? {
            Claim::Settle(quote) => quote,
            Claim::Done(payout) => return self.recorded_outcome(payout),
        };

        let service = Arc::clone(self);
        tokio::spawn(async move { service.settle(quote).await })
            .await
            .map_err(|e| SplitterError::Internal(format!("settlement task failed: {}", e)))?
    }

    async fn settle(&self, quote: PendingQuote) -> Result<CompletedPayout> {
        let quote_id = quote.quote_id;
        let worker_id = quote.worker_id;
        let fee = quote.fee.fee_amount;

        let received = match self
            .gateway
            .check_tokens_received(&self.wallets.collection, fee)
            .await
        {
            Ok(received) => received,
            Err(e) => {
                self.quotes.reopen(quote_id);
                return Err(e);
            }
        };

        if !received {
            info!(
                worker_id = worker_id,
                quote_id = %quote_id,
                fee_amount = fee,
                "Fee not yet received"
            );
            self.quotes.reopen(quote_id);
            return Err(SplitterError::PaymentNotYetReceived {
                address: self.wallets.collection.clone(),
                amount: fee,
            });
        }

        // Recorded before any owner is paid
        let mut record = NewTransaction {
            worker_id,
            withdraw_amount: quote.fee.withdraw_amount,
            fee_amount: fee,
            owner_1_received: quote.fee.owner_1_received,
            owner_2_received: quote.fee.owner_2_received,
            status: STATUS_SETTLING.to_string(),
            screenshot_reference: quote.screenshot_reference,
        };

        let transaction_id = match self.store.append_transaction(&record).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    worker_id = worker_id,
                    quote_id = %quote_id,
                    fee_amount = fee,
                    error = %e,
                    "Fee received but the transaction could not be recorded"
                );
                self.quotes.reopen(quote_id);
                return Err(e);
            }
        };

        let (unpaid, transfer_error) = self.pay_owners(&quote.fee).await;
        record.status = payout_status(&unpaid);

        if let Err(e) = self
            .store
            .set_transaction_status(transaction_id, &record.status)
            .await
        {
            error!(
                transaction_id = transaction_id,
                status = %record.status,
                error = %e,
                "Could not store the final payout status"
            );
        }

        let payout = CompletedPayout {
            transaction_id,
            record,
        };
        self.quotes.settled(quote_id, payout.clone());

        if let Some(e) = transfer_error {
            error!(
                worker_id = worker_id,
                quote_id = %quote_id,
                transaction_id = transaction_id,
                status = %payout.record.status,
                error = %e,
                "Owner payout failed"
            );
            return Err(e);
        }

        info!(
            worker_id = worker_id,
            quote_id = %quote_id,
            transaction_id = transaction_id,
            fee_amount = fee,
            owner_1_received = payout.record.owner_1_received,
            owner_2_received = payout.record.owner_2_received,
            "Payout completed"
        );

        Ok(payout)
    }

    /// Repeat the answer of an earlier settlement
    fn recorded_outcome(&self, payout: CompletedPayout) -> Result<CompletedPayout> {
        if payout.record.status == STATUS_COMPLETED {
            return Ok(payout);
        }

        Err(SplitterError::PaymentGateway {
            service: self.gateway.name().to_string(),
            message: format!(
                "transaction {} recorded as {}",
                payout.transaction_id, payout.record.status
            ),
        })
    }

    /// Drop an open quote
    pub fn cancel(&self, worker_id: WorkerId, quote_id: Uuid) -> Result<()> {
        self.quotes.cancel(worker_id, quote_id)?;
        info!(worker_id = worker_id, quote_id = %quote_id, "Quote cancelled");
        Ok(())
    }

    pub fn open_quotes(&self) -> usize {
        self.quotes.open_count()
    }

    pub async fn history(&self, worker_id: WorkerId) -> Result<Vec<Transaction>> {
        self.store.list_transactions(worker_id).await
    }

    pub async fn is_admin(&self, user_id: WorkerId) -> Result<bool> {
        self.store.is_admin(user_id).await
    }

    pub async fn list_workers(&self) -> Result<Vec<WorkerConfig>> {
        self.store.list_workers().await
    }

    pub async fn set_base_percentage(&self, worker_id: WorkerId, value: f64) -> Result<WorkerConfig> {
        let value = ensure_finite("value", value)?;
        self.store.set_base_percentage(worker_id, value).await?;
        info!(worker_id = worker_id, base_percentage = value, "Base percentage updated");
        self.store.get_or_create_worker_config(worker_id).await
    }

    /// Shares are stored as given; a pair not summing to 1.0 is only reported
    pub async fn set_owner_shares(
        &self,
        worker_id: WorkerId,
        owner_1: f64,
        owner_2: f64,
    ) -> Result<WorkerConfig> {
        let owner_1 = ensure_finite("owner_1_share", owner_1)?;
        let owner_2 = ensure_finite("owner_2_share", owner_2)?;

        if ((owner_1 + owner_2) - 1.0).abs() > SHARE_SUM_TOLERANCE {
            warn!(
                worker_id = worker_id,
                owner_1_share = owner_1,
                owner_2_share = owner_2,
                "Owner shares do not sum to 1.0"
            );
        }

        self.store.set_owner_shares(worker_id, owner_1, owner_2).await?;
        info!(
            worker_id = worker_id,
            owner_1_share = owner_1,
            owner_2_share = owner_2,
            "Owner shares updated"
        );
        self.store.get_or_create_worker_config(worker_id).await
    }

    pub async fn set_quota_enabled(&self, worker_id: WorkerId, enabled: bool) -> Result<WorkerConfig> {
        self.store.set_quota_enabled(worker_id, enabled).await?;
        info!(worker_id = worker_id, use_quota_logic = enabled, "Quota mode updated");
        self.store.get_or_create_worker_config(worker_id).await
    }

    pub async fn set_daily_quota(&self, worker_id: WorkerId, value: f64) -> Result<WorkerConfig> {
        let value = ensure_finite("value", value)?;
        self.store.set_daily_quota(worker_id, value).await?;
        info!(worker_id = worker_id, daily_quota = value, "Daily quota updated");
        self.store.get_or_create_worker_config(worker_id).await
    }

    pub async fn pending_balances(&self) -> Result<PendingBalances> {
        self.store.pending_balances().await
    }

    /// Mark everything pending for `owner` as withdrawn
    pub async fn reset_owner(&self, owner: Owner) -> Result<OwnerReset> {
        let reset_count = self.store.reset_pending(owner).await?;
        let pending = self.store.pending_balances().await?;
        info!(owner = %owner, reset_count = reset_count, "Owner balance withdrawn");
        Ok(OwnerReset {
            owner,
            reset_count,
            pending,
        })
    }

    /// Forward each owner's share. Zero shares are not sent.
    ///
    /// Returns the owners left unpaid and the first transfer error.
    async fn pay_owners(&self, fee: &FeeQuote) -> (Vec<Owner>, Option<SplitterError>) {
        let mut unpaid = Vec::new();
        let mut first_error = None;

        for owner in Owner::all() {
            let amount = match owner {
                Owner::One => fee.owner_1_received,
                Owner::Two => fee.owner_2_received,
            };
            if amount <= 0.0 {
                continue;
            }

            if let Err(e) = self.gateway.send_tokens(amount, self.wallet_for(owner)).await {
                warn!(owner = %owner, amount = amount, error = %e, "Owner transfer failed");
                unpaid.push(owner);
                first_error.get_or_insert(e);
            }
        }

        (unpaid, first_error)
    }

    fn wallet_for(&self, owner: Owner) -> &str {
        match owner {
            Owner::One => &self.wallets.owner_1,
            Owner::Two => &self.wallets.owner_2,
        }
    }
}

fn quote_not_found(quote_id: Uuid) -> SplitterError {
    SplitterError::NotFound {
        resource: format!("quote {}", quote_id),
    }
}
