//! Mapping from domain failures to HTTP responses.
//!
//! Every failure leaves as a non-2xx status with an [`ErrorBody`] whose
//! `code` is stable.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use securescape_core::{LedgerError, TransferError};
use securescape_store::StoreError;
use securescape_types::wire::ErrorBody;

pub(crate) type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn api_error(
    status: StatusCode,
    code: &str,
    error: impl Into<String>,
    message: impl Into<String>,
) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
            code: code.to_string(),
            message: message.into(),
        }),
    )
}

pub(crate) fn transfer_error(err: &TransferError) -> ApiError {
    let (status, message) = match err {
        TransferError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Session has no user"),
        TransferError::InvalidToken => {
            (StatusCode::FORBIDDEN, "Request blocked by CSRF protection")
        }
        TransferError::Ledger(LedgerError::Storage(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Transfer failed")
        }
        TransferError::Ledger(_) => (StatusCode::UNPROCESSABLE_ENTITY, "Transfer refused"),
    };
    api_error(status, err.code(), err.to_string(), message)
}

pub(crate) fn store_error(err: &StoreError) -> ApiError {
    tracing::error!(error = %err, "Store operation failed");
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "STORAGE",
        err.to_string(),
        "The demo database could not complete the request",
    )
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            "MALFORMED_REQUEST",
            rejection.body_text(),
            "Request body is not valid for this endpoint",
        )
    })
}

pub(crate) fn query_params<T>(
    query: Result<axum::extract::Query<T>, QueryRejection>,
) -> Result<T, ApiError> {
    query
        .map(|axum::extract::Query(value)| value)
        .map_err(|rejection| {
            api_error(
                StatusCode::BAD_REQUEST,
                "MALFORMED_REQUEST",
                rejection.body_text(),
                "Query string is not valid for this endpoint",
            )
        })
}
