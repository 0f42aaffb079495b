//! Handler error type.
//!
//! Every failure is answered with `{"error": "<message>"}`. Store errors are
//! not classified: whatever the store said is passed to the caller with a 500.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use shared::api::error::ErrorResponse;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to render page: {0}")]
    Render(#[from] minijinja::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Store(StoreError::Rejected { status, message }) => {
                tracing::error!(upstream_status = status, %message, "store rejected request")
            }
            ApiError::Store(err) => tracing::error!(error = ?err, "store request failed"),
            ApiError::Render(err) => tracing::error!(error = %err, "template rendering failed"),
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}
