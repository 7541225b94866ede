//! HTTP middleware implementations

use crate::api::error::ApiError;
use crate::app::AppState;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use types::{SplitterError, WorkerId};

/// Header carrying the caller's admin id
pub const ADMIN_HEADER: &str = "x-admin-id";

/// Let the request through only for a seeded admin
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let admin_id: WorkerId = request
        .headers()
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| SplitterError::Unauthorized(format!("missing or malformed {} header", ADMIN_HEADER)))?;

    if !state.payouts.is_admin(admin_id).await? {
        tracing::warn!(
            admin_id = admin_id,
            path = %request.uri().path(),
            "Rejected admin request"
        );
        return Err(SplitterError::Unauthorized(format!("{} is not an admin", admin_id)).into());
    }

    Ok(next.run(request).await)
}
