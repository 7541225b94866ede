//! HTTP API request handlers

use crate::api::error::ApiError;
use crate::app::AppState;
use crate::payout::{CompletedPayout, OwnerReset, PendingQuote};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use types::{Owner, PendingBalances, WorkerConfig, WorkerId};
use uuid::Uuid;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub withdraw_amount: f64,
    /// Opaque reference to the worker's proof of withdrawal
    #[serde(default)]
    pub screenshot_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct ValueRequest {
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct SharesRequest {
    pub owner_1_share: f64,
    pub owner_2_share: f64,
}

#[derive(Debug, Deserialize)]
pub struct QuotaRequest {
    pub enabled: bool,
}

/// Quote the fee for a withdrawal
pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<WorkerId>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<(StatusCode, Json<PendingQuote>)> {
    let quote = state
        .payouts
        .quote(worker_id, request.withdraw_amount, request.screenshot_reference)
        .await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// Confirm that the quoted fee was paid
pub async fn confirm_quote(
    State(state): State<Arc<AppState>>,
    Path((worker_id, quote_id)): Path<(WorkerId, Uuid)>,
) -> ApiResult<(StatusCode, Json<CompletedPayout>)> {
    let payout = state.payouts.confirm(worker_id, quote_id).await?;
    Ok((StatusCode::CREATED, Json(payout)))
}

pub async fn cancel_quote(
    State(state): State<Arc<AppState>>,
    Path((worker_id, quote_id)): Path<(WorkerId, Uuid)>,
) -> ApiResult<Json<Value>> {
    state.payouts.cancel(worker_id, quote_id)?;
    Ok(Json(json!({
        "quote_id": quote_id,
        "status": "cancelled"
    })))
}

pub async fn worker_history(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<WorkerId>,
) -> ApiResult<Json<Value>> {
    let transactions = state.payouts.history(worker_id).await?;
    Ok(Json(json!({
        "worker_id": worker_id,
        "transactions": transactions
    })))
}

pub async fn list_workers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let workers = state.payouts.list_workers().await?;
    Ok(Json(json!({ "workers": workers })))
}

pub async fn set_base_percentage(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<WorkerId>,
    Json(request): Json<ValueRequest>,
) -> ApiResult<Json<WorkerConfig>> {
    let config = state.payouts.set_base_percentage(worker_id, request.value).await?;
    Ok(Json(config))
}

pub async fn set_owner_shares(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<WorkerId>,
    Json(request): Json<SharesRequest>,
) -> ApiResult<Json<WorkerConfig>> {
    let config = state
        .payouts
        .set_owner_shares(worker_id, request.owner_1_share, request.owner_2_share)
        .await?;
    Ok(Json(config))
}

pub async fn set_quota_enabled(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<WorkerId>,
    Json(request): Json<QuotaRequest>,
) -> ApiResult<Json<WorkerConfig>> {
    let config = state.payouts.set_quota_enabled(worker_id, request.enabled).await?;
    Ok(Json(config))
}

pub async fn set_daily_quota(
    State(state): State<Arc<AppState>>,
    Path(worker_id): Path<WorkerId>,
    Json(request): Json<ValueRequest>,
) -> ApiResult<Json<WorkerConfig>> {
    let config = state.payouts.set_daily_quota(worker_id, request.value).await?;
    Ok(Json(config))
}

/// Amounts each owner has not yet withdrawn
pub async fn pending_balances(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PendingBalances>> {
    Ok(Json(state.payouts.pending_balances().await?))
}

pub async fn reset_owner(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> ApiResult<Json<OwnerReset>> {
    let owner: Owner = owner.parse()?;
    Ok(Json(state.payouts.reset_owner(owner).await?))
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let db_healthy = state.store.health_check().await.is_ok();

    let status = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if db_healthy { "healthy" } else { "unhealthy" },
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "components": {
                "database": if db_healthy { "healthy" } else { "unhealthy" },
                "open_quotes": state.payouts.open_quotes()
            }
        })),
    )
}
