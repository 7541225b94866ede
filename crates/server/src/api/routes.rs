//! API route definitions

use crate::api::{handlers, middleware::require_admin};
use crate::app::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Create the main API router
pub fn create_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin = Router::new()
        .route("/admin/workers", get(handlers::list_workers))
        .route("/admin/workers/:worker_id/percentage", put(handlers::set_base_percentage))
        .route("/admin/workers/:worker_id/shares", put(handlers::set_owner_shares))
        .route("/admin/workers/:worker_id/quota", put(handlers::set_quota_enabled))
        .route("/admin/workers/:worker_id/daily-quota", put(handlers::set_daily_quota))
        .route("/admin/owners/pending", get(handlers::pending_balances))
        .route("/admin/owners/:owner/reset", post(handlers::reset_owner))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        // Worker endpoints
        .route("/workers/:worker_id/quotes", post(handlers::create_quote))
        .route(
            "/workers/:worker_id/quotes/:quote_id",
            delete(handlers::cancel_quote),
        )
        .route(
            "/workers/:worker_id/quotes/:quote_id/confirm",
            post(handlers::confirm_quote),
        )
        .route("/workers/:worker_id/transactions", get(handlers::worker_history))
        // Health endpoint
        .route("/healthz", get(handlers::health_check))
        .merge(admin)
}
