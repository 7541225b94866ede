//! Mapping of domain errors onto HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use types::SplitterError;

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(pub SplitterError);

impl From<SplitterError> for ApiError {
    fn from(err: SplitterError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SplitterError::Validation(_) => StatusCode::BAD_REQUEST,
            SplitterError::Unauthorized(_) => StatusCode::FORBIDDEN,
            SplitterError::NotFound { .. } => StatusCode::NOT_FOUND,
            SplitterError::Conflict(_) => StatusCode::CONFLICT,
            SplitterError::PaymentNotYetReceived { .. } => StatusCode::ACCEPTED,
            SplitterError::PaymentGateway { .. } => StatusCode::BAD_GATEWAY,
            SplitterError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SplitterError::Config(_) | SplitterError::Export(_) | SplitterError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self.0 {
            // Not a failure: the worker is asked to try again later
            SplitterError::PaymentNotYetReceived { address, amount } => json!({
                "status": "awaiting_payment",
                "address": address,
                "amount": amount,
            }),
            err => {
                if status.is_server_error() {
                    tracing::error!(status = status.as_u16(), error = %err, "Request failed");
                }
                json!({ "error": err.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}
