//! Ledger storage operations

use crate::database::Database;
use crate::export::{ExportSink, NoopExportSink};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, SqliteConnection};
use std::sync::Arc;
use types::utils::{format_timestamp, parse_timestamp};
use types::{
    Clock, LedgerError, NewTransaction, Owner, PendingBalances, Result, SplitterError,
    SystemClock, Transaction, WorkerConfig, WorkerId, DEFAULT_BASE_PERCENTAGE,
    DEFAULT_DAILY_QUOTA, DEFAULT_OWNER_1_SHARE, DEFAULT_OWNER_2_SHARE, STATUS_SETTLING,
};

/// Ledger storage interface
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Get a worker's configuration, creating the default row if missing
    async fn get_or_create_worker_config(&self, worker_id: WorkerId) -> Result<WorkerConfig>;

    /// Set the flat-rate fee percentage
    async fn set_base_percentage(&self, worker_id: WorkerId, value: f64) -> Result<()>;

    /// Set both owner shares
    async fn set_owner_shares(&self, worker_id: WorkerId, owner_1: f64, owner_2: f64) -> Result<()>;

    /// Enable or disable tiered quota rates
    async fn set_quota_enabled(&self, worker_id: WorkerId, enabled: bool) -> Result<()>;

    /// Set the per-day quota amount
    async fn set_daily_quota(&self, worker_id: WorkerId, value: f64) -> Result<()>;

    /// Record a transaction and return its id.
    ///
    /// Records still settling are exported once their status is final.
    async fn append_transaction(&self, transaction: &NewTransaction) -> Result<i64>;

    /// Replace a transaction's status. Amounts and withdrawal flags are untouched.
    async fn set_transaction_status(&self, transaction_id: i64, status: &str) -> Result<()>;

    /// Timestamp of the worker's most recent transaction
    async fn last_transaction_timestamp(&self, worker_id: WorkerId) -> Result<Option<NaiveDateTime>>;

    /// Sum the owner's shares not yet withdrawn
    async fn pending_sum(&self, owner: Owner) -> Result<f64>;

    /// Mark every pending share of the owner withdrawn, returning how many records changed
    async fn reset_pending(&self, owner: Owner) -> Result<u64>;

    /// List all configured workers
    async fn list_workers(&self) -> Result<Vec<WorkerConfig>>;

    /// List a worker's transactions, oldest first
    async fn list_transactions(&self, worker_id: WorkerId) -> Result<Vec<Transaction>>;

    /// Check admin membership
    async fn is_admin(&self, user_id: WorkerId) -> Result<bool>;

    /// Check that the backing store is reachable
    async fn health_check(&self) -> Result<()>;

    /// Pending sums for both owners
    async fn pending_balances(&self) -> Result<PendingBalances> {
        Ok(PendingBalances {
            owner_1: self.pending_sum(Owner::One).await?,
            owner_2: self.pending_sum(Owner::Two).await?,
        })
    }
}

#[derive(FromRow)]
struct WorkerRow {
    worker_id: i64,
    base_percentage: f64,
    owner_1_share: f64,
    owner_2_share: f64,
    use_quota_logic: bool,
    daily_quota: f64,
}

impl From<WorkerRow> for WorkerConfig {
    fn from(row: WorkerRow) -> Self {
        Self {
            worker_id: row.worker_id,
            base_percentage: row.base_percentage,
            owner_1_share: row.owner_1_share,
            owner_2_share: row.owner_2_share,
            use_quota_logic: row.use_quota_logic,
            daily_quota: row.daily_quota,
        }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    worker_id: i64,
    withdraw_amount: f64,
    fee_amount: f64,
    owner_1_received: f64,
    owner_2_received: f64,
    status: String,
    screenshot_reference: String,
    owner_1_withdrawn: bool,
    owner_2_withdrawn: bool,
    timestamp: String,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = LedgerError;

    fn try_from(row: TransactionRow) -> std::result::Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&row.timestamp).map_err(|message| {
            LedgerError::CorruptRecord {
                table: "transactions".to_string(),
                message,
            }
        })?;

        Ok(Self {
            id: row.id,
            worker_id: row.worker_id,
            withdraw_amount: row.withdraw_amount,
            fee_amount: row.fee_amount,
            owner_1_received: row.owner_1_received,
            owner_2_received: row.owner_2_received,
            status: row.status,
            screenshot_reference: row.screenshot_reference,
            owner_1_withdrawn: row.owner_1_withdrawn,
            owner_2_withdrawn: row.owner_2_withdrawn,
            timestamp,
        })
    }
}

impl TransactionRow {
    /// The fields exported for this row
    fn into_record(self) -> NewTransaction {
        NewTransaction {
            worker_id: self.worker_id,
            withdraw_amount: self.withdraw_amount,
            fee_amount: self.fee_amount,
            owner_1_received: self.owner_1_received,
            owner_2_received: self.owner_2_received,
            status: self.status,
            screenshot_reference: self.screenshot_reference,
        }
    }
}

const TRANSACTION_COLUMNS: &str = "id, worker_id, withdraw_amount, fee_amount, \
     owner_1_received, owner_2_received, status, screenshot_reference, \
     owner_1_withdrawn, owner_2_withdrawn, timestamp";

const WORKER_COLUMNS: &str =
    "worker_id, base_percentage, owner_1_share, owner_2_share, use_quota_logic, daily_quota";

/// SQLite implementation of ledger storage
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    database: Database,
    clock: Arc<dyn Clock>,
    export: Arc<dyn ExportSink>,
}

impl SqliteLedgerStore {
    /// Create a store using the system clock and no export
    pub fn new(database: Database) -> Self {
        Self {
            database,
            clock: Arc::new(SystemClock),
            export: Arc::new(NoopExportSink),
        }
    }

    /// Use a different clock for transaction timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Forward appended transactions to `export`
    pub fn with_export(mut self, export: Arc<dyn ExportSink>) -> Self {
        self.export = export;
        self
    }

    /// Insert admin ids; ids already present are ignored
    pub async fn seed_admins(&self, admin_ids: &[WorkerId]) -> Result<()> {
        let mut tx = self.database.pool().begin().await.map_err(query_failed)?;
        for admin_id in admin_ids {
            sqlx::query("INSERT OR IGNORE INTO admins (admin_id) VALUES (?)")
                .bind(admin_id)
                .execute(&mut *tx)
                .await
                .map_err(query_failed)?;
        }
        tx.commit().await.map_err(query_failed)?;

        tracing::info!(count = admin_ids.len(), "Seeded admin ids");
        Ok(())
    }

    /// Get the underlying database
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The ledger row is authoritative; export is best-effort.
    fn export(&self, transaction_id: i64, record: &NewTransaction) {
        if let Err(e) = self.export.append(record) {
            tracing::warn!(
                transaction_id = transaction_id,
                sink = self.export.name(),
                error = %e,
                "Failed to export transaction"
            );
        }
    }

    /// Run `update` against a worker row that is guaranteed to exist
    async fn upsert_worker<'q>(
        &self,
        worker_id: WorkerId,
        update: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> Result<()> {
        let mut tx = self.database.pool().begin().await.map_err(query_failed)?;
        ensure_config(&mut *tx, worker_id).await?;
        update.execute(&mut *tx).await.map_err(query_failed)?;
        tx.commit().await.map_err(query_failed)?;
        Ok(())
    }
}

/// Insert the default row for `worker_id` unless one exists
async fn ensure_config(conn: &mut SqliteConnection, worker_id: WorkerId) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO workers
            (worker_id, base_percentage, owner_1_share, owner_2_share, use_quota_logic, daily_quota)
        VALUES (?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(worker_id)
    .bind(DEFAULT_BASE_PERCENTAGE)
    .bind(DEFAULT_OWNER_1_SHARE)
    .bind(DEFAULT_OWNER_2_SHARE)
    .bind(DEFAULT_DAILY_QUOTA)
    .execute(conn)
    .await
    .map_err(query_failed)?;
    Ok(())
}

fn query_failed(err: sqlx::Error) -> SplitterError {
    LedgerError::QueryFailed(err.to_string()).into()
}

fn owner_columns(owner: Owner) -> (&'static str, &'static str) {
    match owner {
        Owner::One => ("owner_1_received", "owner_1_withdrawn"),
        Owner::Two => ("owner_2_received", "owner_2_withdrawn"),
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn get_or_create_worker_config(&self, worker_id: WorkerId) -> Result<WorkerConfig> {
        let mut tx = self.database.pool().begin().await.map_err(query_failed)?;
        ensure_config(&mut *tx, worker_id).await?;

        let row: WorkerRow = sqlx::query_as(&format!(
            "SELECT {} FROM workers WHERE worker_id = ?",
            WORKER_COLUMNS
        ))
        .bind(worker_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        Ok(row.into())
    }

    async fn set_base_percentage(&self, worker_id: WorkerId, value: f64) -> Result<()> {
        self.upsert_worker(
            worker_id,
            sqlx::query("UPDATE workers SET base_percentage = ? WHERE worker_id = ?")
                .bind(value)
                .bind(worker_id),
        )
        .await
    }

    async fn set_owner_shares(&self, worker_id: WorkerId, owner_1: f64, owner_2: f64) -> Result<()> {
        self.upsert_worker(
            worker_id,
            sqlx::query("UPDATE workers SET owner_1_share = ?, owner_2_share = ? WHERE worker_id = ?")
                .bind(owner_1)
                .bind(owner_2)
                .bind(worker_id),
        )
        .await
    }

    async fn set_quota_enabled(&self, worker_id: WorkerId, enabled: bool) -> Result<()> {
        self.upsert_worker(
            worker_id,
            sqlx::query("UPDATE workers SET use_quota_logic = ? WHERE worker_id = ?")
                .bind(enabled)
                .bind(worker_id),
        )
        .await
    }

    async fn set_daily_quota(&self, worker_id: WorkerId, value: f64) -> Result<()> {
        self.upsert_worker(
            worker_id,
            sqlx::query("UPDATE workers SET daily_quota = ? WHERE worker_id = ?")
                .bind(value)
                .bind(worker_id),
        )
        .await
    }

    async fn append_transaction(&self, transaction: &NewTransaction) -> Result<i64> {
        let timestamp = format_timestamp(&self.clock.now());

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                worker_id, withdraw_amount, fee_amount,
                owner_1_received, owner_2_received,
                status, screenshot_reference,
                owner_1_withdrawn, owner_2_withdrawn,
                timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, ?)
            "#,
        )
        .bind(transaction.worker_id)
        .bind(transaction.withdraw_amount)
        .bind(transaction.fee_amount)
        .bind(transaction.owner_1_received)
        .bind(transaction.owner_2_received)
        .bind(&transaction.status)
        .bind(&transaction.screenshot_reference)
        .bind(&timestamp)
        .execute(self.database.pool())
        .await
        .map_err(query_failed)?;

        let id = result.last_insert_rowid();
        tracing::info!(
            transaction_id = id,
            worker_id = transaction.worker_id,
            fee_amount = transaction.fee_amount,
            timestamp = %timestamp,
            "Recorded transaction"
        );

        if transaction.status != STATUS_SETTLING {
            self.export(id, transaction);
        }

        Ok(id)
    }

    async fn set_transaction_status(&self, transaction_id: i64, status: &str) -> Result<()> {
        let mut tx = self.database.pool().begin().await.map_err(query_failed)?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT status FROM transactions WHERE id = ?")
                .bind(transaction_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_failed)?;
        let previous = previous.ok_or_else(|| SplitterError::NotFound {
            resource: format!("transaction {}", transaction_id),
        })?;

        sqlx::query("UPDATE transactions SET status = ? WHERE id = ?")
            .bind(status)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

        let row: TransactionRow = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        tracing::info!(transaction_id = transaction_id, status = status, "Transaction status updated");

        if previous == STATUS_SETTLING && status != STATUS_SETTLING {
            self.export(transaction_id, &row.into_record());
        }
        Ok(())
    }

    async fn last_transaction_timestamp(&self, worker_id: WorkerId) -> Result<Option<NaiveDateTime>> {
        let timestamp: Option<String> = sqlx::query_scalar(
            "SELECT timestamp FROM transactions WHERE worker_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(worker_id)
        .fetch_optional(self.database.pool())
        .await
        .map_err(query_failed)?;

        timestamp
            .map(|ts| {
                parse_timestamp(&ts).map_err(|message| {
                    LedgerError::CorruptRecord {
                        table: "transactions".to_string(),
                        message,
                    }
                    .into()
                })
            })
            .transpose()
    }

    async fn pending_sum(&self, owner: Owner) -> Result<f64> {
        let (received, withdrawn) = owner_columns(owner);
        let sum: f64 = sqlx::query_scalar(&format!(
            "SELECT CAST(COALESCE(SUM({}), 0.0) AS REAL) FROM transactions WHERE {} = 0",
            received, withdrawn
        ))
        .fetch_one(self.database.pool())
        .await
        .map_err(query_failed)?;

        Ok(sum)
    }

    async fn reset_pending(&self, owner: Owner) -> Result<u64> {
        let (_, withdrawn) = owner_columns(owner);
        let result = sqlx::query(&format!(
            "UPDATE transactions SET {0} = 1 WHERE {0} = 0",
            withdrawn
        ))
        .execute(self.database.pool())
        .await
        .map_err(query_failed)?;

        let marked = result.rows_affected();
        tracing::info!(owner = %owner, marked = marked, "Reset pending balance");
        Ok(marked)
    }

    async fn list_workers(&self) -> Result<Vec<WorkerConfig>> {
        let rows: Vec<WorkerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM workers ORDER BY worker_id",
            WORKER_COLUMNS
        ))
        .fetch_all(self.database.pool())
        .await
        .map_err(query_failed)?;

        Ok(rows.into_iter().map(WorkerConfig::from).collect())
    }

    async fn list_transactions(&self, worker_id: WorkerId) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE worker_id = ? ORDER BY id",
            TRANSACTION_COLUMNS
        ))
        .bind(worker_id)
        .fetch_all(self.database.pool())
        .await
        .map_err(query_failed)?;

        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(SplitterError::from))
            .collect()
    }

    async fn is_admin(&self, user_id: WorkerId) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT admin_id FROM admins WHERE admin_id = ?")
            .bind(user_id)
            .fetch_optional(self.database.pool())
            .await
            .map_err(query_failed)?;

        Ok(found.is_some())
    }

    async fn health_check(&self) -> Result<()> {
        self.database
            .health_check()
            .await
            .map_err(|e| LedgerError::ConnectionFailed(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use std::sync::Mutex;
    use types::{ExportError, ManualClock};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn test_store() -> (SqliteLedgerStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let database = Database::new_in_memory().await.unwrap();
        let store = SqliteLedgerStore::new(database).with_clock(clock.clone());
        (store, clock)
    }

    fn payout(worker_id: WorkerId, owner_1: f64, owner_2: f64) -> NewTransaction {
        NewTransaction {
            worker_id,
            withdraw_amount: 100.0,
            fee_amount: owner_1 + owner_2,
            owner_1_received: owner_1,
            owner_2_received: owner_2,
            status: "completed".to_string(),
            screenshot_reference: format!("shot-{}", worker_id),
        }
    }

    async fn worker_row_count(store: &SqliteLedgerStore, worker_id: WorkerId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM workers WHERE worker_id = ?")
            .bind(worker_id)
            .fetch_one(store.database().pool())
            .await
            .unwrap()
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        records: Mutex<Vec<NewTransaction>>,
        fail: bool,
    }

    impl ExportSink for RecordingSink {
        fn append(&self, record: &NewTransaction) -> std::result::Result<(), ExportError> {
            if self.fail {
                return Err(ExportError::Encoding("sink offline".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (store, _) = test_store().await;

        let first = store.get_or_create_worker_config(77).await.unwrap();
        let second = store.get_or_create_worker_config(77).await.unwrap();

        assert_eq!(first, WorkerConfig::with_defaults(77));
        assert_eq!(first, second);
        assert_eq!(worker_row_count(&store, 77).await, 1);
    }

    #[tokio::test]
    async fn test_setters_upsert_missing_worker() {
        let (store, _) = test_store().await;

        store.set_base_percentage(1, 12.5).await.unwrap();
        store.set_owner_shares(2, 0.7, 0.3).await.unwrap();
        store.set_quota_enabled(3, true).await.unwrap();
        store.set_daily_quota(4, 40.0).await.unwrap();

        let one = store.get_or_create_worker_config(1).await.unwrap();
        assert_eq!(one.base_percentage, 12.5);
        assert_eq!(one.owner_1_share, 0.5);

        let two = store.get_or_create_worker_config(2).await.unwrap();
        assert_eq!((two.owner_1_share, two.owner_2_share), (0.7, 0.3));
        assert_eq!(two.base_percentage, 30.0);

        let three = store.get_or_create_worker_config(3).await.unwrap();
        assert!(three.use_quota_logic);
        assert_eq!(three.daily_quota, 13.0);

        let four = store.get_or_create_worker_config(4).await.unwrap();
        assert_eq!(four.daily_quota, 40.0);
        assert!(!four.use_quota_logic);

        assert_eq!(store.list_workers().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_setters_update_only_named_field() {
        let (store, _) = test_store().await;

        store.set_owner_shares(9, 0.6, 0.6).await.unwrap();
        store.set_quota_enabled(9, true).await.unwrap();
        store.set_base_percentage(9, 250.0).await.unwrap();

        let config = store.get_or_create_worker_config(9).await.unwrap();
        assert_eq!(config.base_percentage, 250.0);
        assert_eq!((config.owner_1_share, config.owner_2_share), (0.6, 0.6));
        assert!(config.use_quota_logic);
        assert_eq!(worker_row_count(&store, 9).await, 1);
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids_and_tracks_last_timestamp() {
        let (store, clock) = test_store().await;

        assert_eq!(store.last_transaction_timestamp(5).await.unwrap(), None);

        let first = store.append_transaction(&payout(5, 1.0, 1.0)).await.unwrap();
        clock.advance(TimeDelta::minutes(90));
        let other = store.append_transaction(&payout(6, 1.0, 1.0)).await.unwrap();
        clock.advance(TimeDelta::minutes(30));
        let second = store.append_transaction(&payout(5, 2.0, 2.0)).await.unwrap();

        assert!(first < other && other < second);
        assert_eq!(
            store.last_transaction_timestamp(5).await.unwrap(),
            Some(start() + TimeDelta::minutes(120))
        );
        assert_eq!(
            store.last_transaction_timestamp(6).await.unwrap(),
            Some(start() + TimeDelta::minutes(90))
        );
    }

    #[tokio::test]
    async fn test_last_timestamp_follows_insertion_order() {
        let (store, clock) = test_store().await;

        store.append_transaction(&payout(5, 1.0, 1.0)).await.unwrap();
        // Clock moved backwards between appends
        clock.set(start() - TimeDelta::hours(3));
        store.append_transaction(&payout(5, 1.0, 1.0)).await.unwrap();

        assert_eq!(
            store.last_transaction_timestamp(5).await.unwrap(),
            Some(start() - TimeDelta::hours(3))
        );
    }

    #[tokio::test]
    async fn test_new_transactions_are_pending_for_both_owners() {
        let (store, _) = test_store().await;

        store.append_transaction(&payout(3, 4.5, 1.5)).await.unwrap();

        let history = store.list_transactions(3).await.unwrap();
        assert_eq!(history.len(), 1);
        let tx = &history[0];
        assert!(!tx.owner_1_withdrawn && !tx.owner_2_withdrawn);
        assert_eq!(tx.timestamp, start());
        assert_eq!(tx.received_by(Owner::One), 4.5);
        assert_eq!(tx.status, "completed");
        assert_eq!(tx.screenshot_reference, "shot-3");
    }

    #[tokio::test]
    async fn test_status_update_keeps_amounts() {
        let (store, _) = test_store().await;

        let id = store.append_transaction(&payout(4, 2.0, 1.0)).await.unwrap();
        store.set_transaction_status(id, "payout_failed:owner2").await.unwrap();

        let tx = &store.list_transactions(4).await.unwrap()[0];
        assert_eq!(tx.status, "payout_failed:owner2");
        assert_eq!(tx.owner_1_received, 2.0);
        assert_eq!(tx.owner_2_received, 1.0);
        assert!(!tx.owner_1_withdrawn && !tx.owner_2_withdrawn);

        let err = store.set_transaction_status(id + 1, "completed").await.unwrap_err();
        assert!(matches!(err, SplitterError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_pending_sum_on_empty_ledger_is_zero() {
        let (store, _) = test_store().await;
        assert_eq!(store.pending_sum(Owner::One).await.unwrap(), 0.0);
        assert_eq!(store.pending_sum(Owner::Two).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_reset_pending_only_touches_one_owner() {
        let (store, _) = test_store().await;

        store.append_transaction(&payout(1, 3.0, 1.0)).await.unwrap();
        store.append_transaction(&payout(2, 6.0, 2.0)).await.unwrap();

        assert_eq!(store.pending_sum(Owner::One).await.unwrap(), 9.0);
        assert_eq!(store.pending_sum(Owner::Two).await.unwrap(), 3.0);

        assert_eq!(store.reset_pending(Owner::One).await.unwrap(), 2);

        assert_eq!(store.pending_sum(Owner::One).await.unwrap(), 0.0);
        assert_eq!(store.pending_sum(Owner::Two).await.unwrap(), 3.0);
        for worker_id in [1, 2] {
            for tx in store.list_transactions(worker_id).await.unwrap() {
                assert!(tx.withdrawn_by(Owner::One));
                assert!(!tx.withdrawn_by(Owner::Two));
            }
        }

        // New records after a reset are pending again
        store.append_transaction(&payout(1, 0.5, 0.25)).await.unwrap();
        let balances = store.pending_balances().await.unwrap();
        assert_eq!(balances.owner_1, 0.5);
        assert_eq!(balances.owner_2, 3.25);

        // Resetting again only marks the new record
        assert_eq!(store.reset_pending(Owner::One).await.unwrap(), 1);
        assert_eq!(store.reset_pending(Owner::One).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seeded_admins() {
        let (store, _) = test_store().await;

        store.seed_admins(&[10, 20, 10]).await.unwrap();
        store.seed_admins(&[20]).await.unwrap();

        assert!(store.is_admin(10).await.unwrap());
        assert!(store.is_admin(20).await.unwrap());
        assert!(!store.is_admin(30).await.unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(store.database().pool())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_append_forwards_to_export() {
        let (store, _) = test_store().await;
        let sink = Arc::new(RecordingSink::default());
        let store = store.with_export(sink.clone());

        let record = payout(8, 1.0, 2.0);
        store.append_transaction(&record).await.unwrap();

        assert_eq!(*sink.records.lock().unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_settling_record_is_exported_with_final_status() {
        let (store, _) = test_store().await;
        let sink = Arc::new(RecordingSink::default());
        let store = store.with_export(sink.clone());

        let mut record = payout(8, 1.0, 2.0);
        record.status = STATUS_SETTLING.to_string();
        let id = store.append_transaction(&record).await.unwrap();
        assert!(sink.records.lock().unwrap().is_empty());

        store.set_transaction_status(id, "payout_failed:owner2").await.unwrap();
        let exported = sink.records.lock().unwrap().clone();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].status, "payout_failed:owner2");
        assert_eq!(exported[0].owner_2_received, 2.0);

        // Later corrections are not exported again
        store.set_transaction_status(id, "completed").await.unwrap();
        assert_eq!(sink.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_failure_keeps_ledger_write() {
        let (store, _) = test_store().await;
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let store = store.with_export(sink);

        let id = store.append_transaction(&payout(8, 1.0, 2.0)).await.unwrap();

        let history = store.list_transactions(8).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
    }

    #[tokio::test]
    async fn test_closed_pool_reports_store_unavailable() {
        let (store, _) = test_store().await;
        store.database().close().await;

        let err = store.get_or_create_worker_config(1).await.unwrap_err();
        assert!(matches!(err, SplitterError::StoreUnavailable(_)));
        assert!(store.health_check().await.is_err());
    }
}
