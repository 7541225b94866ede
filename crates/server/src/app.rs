//! Main application structure and lifecycle management

use crate::{api::ApiServer, payout::PayoutService};
use anyhow::{Context, Result};
use chrono::TimeDelta;
use config::Config;
use ledger::{Database, FanoutExportSink, LedgerStore, SqliteLedgerStore};
use std::future::Future;
use std::sync::Arc;
use tracing::info;
use types::{Clock, SystemClock};
use wallet_client::{PaymentGateway, WalletClient};

/// Main application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn LedgerStore>,
    pub payouts: Arc<PayoutService>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let quote_ttl = i64::try_from(config.quotes.ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let payouts = Arc::new(PayoutService::new(
            store.clone(),
            gateway,
            clock,
            config.wallets.clone(),
            quote_ttl,
        ));
        Self {
            config,
            store,
            payouts,
        }
    }
}

/// Main application that coordinates all components
pub struct Application {
    state: Arc<AppState>,
    database: Database,
    api_server: ApiServer,
}

impl Application {
    /// Create a new application instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing application components...");

        // Initialize database
        let database = Database::new(&config.database)
            .await
            .context("Failed to initialize database")?;

        // Run database migrations
        database
            .migrate()
            .await
            .context("Failed to run database migrations")?;

        let export = FanoutExportSink::from_config(&config.export);
        info!(sinks = export.len(), "Transaction export configured");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = SqliteLedgerStore::new(database.clone())
            .with_clock(clock.clone())
            .with_export(Arc::new(export));

        store
            .seed_admins(&config.admins)
            .await
            .context("Failed to seed admins")?;
        info!(admins = config.admins.len(), "Admins seeded");

        let gateway = WalletClient::new(&config.gateway).context("Failed to create wallet client")?;
        info!(base_url = %config.gateway.base_url, asset = %config.gateway.asset, "Wallet service configured");

        let state = Arc::new(AppState::new(
            config,
            Arc::new(store),
            Arc::new(gateway),
            clock,
        ));

        // Initialize API server
        let api_server = ApiServer::new(state.clone()).context("Failed to create API server")?;

        info!("Application components initialized successfully");

        Ok(Self {
            state,
            database,
            api_server,
        })
    }

    /// Serve requests until `shutdown` resolves, then release resources
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            "Starting API server on {}:{}",
            self.state.config.server.host, self.state.config.server.port
        );

        let served = self.api_server.run(shutdown).await;

        self.database.close().await;
        info!("Database connections closed");

        served
    }
}
