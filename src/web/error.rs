use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::markets::DraftError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Carries the header name the caller should have sent
    #[error("Payment required. Include {0} header with format: 'amount recipient purpose'")]
    PaymentRequired(String),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({
                "detail": self.to_string()
            })),
        )
            .into_response()
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
