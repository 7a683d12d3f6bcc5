//! Cross-site request forgery demo.
//!
//! The attack family debits through [`MutationGateway::transfer_permissive`]
//! from both a JSON `POST` and a query-string `GET` (the image-tag vector).
//! The secure family hands out a session-bound token on `/form` and accepts
//! only `POST` transfers that carry it.
//!
//! [`MutationGateway::transfer_permissive`]: securescape_core::MutationGateway::transfer_permissive

use std::net::SocketAddr;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use securescape_types::wire::{
    FormResponse, ProfileResponse, TransferQuery, TransferRequest, TransferResponse,
};
use securescape_types::SecurityMode;
use serde_json::{Value, json};

use crate::error::{ApiError, api_error, json_body, query_params, store_error, transfer_error};
use crate::routes::{blocking, header_text};
use crate::session::{CurrentSession, cookies};
use crate::state::AppState;

pub(super) fn attack_routes() -> Router<AppState> {
    Router::new()
        .route("/csrf/form", get(attack_form))
        .route(
            "/csrf/transfer",
            get(attack_transfer_get).post(attack_transfer),
        )
        .route("/csrf/profile", get(attack_profile))
        .route("/csrf/session-info", get(leak_session_info))
}

pub(super) fn secure_routes() -> Router<AppState> {
    Router::new()
        .route("/csrf/form", get(secure_form))
        .route("/csrf/transfer", post(secure_transfer))
        .route("/csrf/profile", get(secure_profile))
        .route("/csrf/session-info", get(secure_session_info))
}

async fn attack_form() -> Json<FormResponse> {
    Json(FormResponse {
        csrf_token: None,
        message: "Form loaded (no CSRF protection)".to_string(),
        warning: Some("This endpoint is vulnerable to CSRF attacks".to_string()),
    })
}

async fn secure_form(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Json<FormResponse> {
    let token = state.gateway().issue_token(&session.id);
    Json(FormResponse {
        csrf_token: Some(token),
        message: "Form loaded with CSRF protection".to_string(),
        warning: None,
    })
}

async fn permissive_transfer(
    state: AppState,
    session: CurrentSession,
    headers: &HeaderMap,
    to: Option<String>,
    amount: f64,
    warning: &str,
) -> Result<Json<TransferResponse>, ApiError> {
    let outcome = blocking(move || state.gateway().transfer_permissive(&session.id, amount))
        .await?
        .map_err(|err| transfer_error(&err))?;

    Ok(Json(TransferResponse {
        success: true,
        policy: SecurityMode::Attack.transfer_policy(),
        message: "Transfer completed (no CSRF protection)".to_string(),
        to,
        amount,
        new_balance: outcome.new_balance,
        new_csrf_token: None,
        csrf_token_validated: false,
        warning: Some(warning.to_string()),
        request_origin: header_text(headers, header::ORIGIN),
        request_referer: header_text(headers, header::REFERER),
    }))
}

async fn attack_transfer(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    headers: HeaderMap,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let request = json_body(body)?;
    permissive_transfer(
        state,
        session,
        &headers,
        request.to,
        request.amount,
        "This transfer was processed without CSRF token validation",
    )
    .await
}

async fn attack_transfer_get(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    headers: HeaderMap,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let query = query_params(query)?;
    permissive_transfer(
        state,
        session,
        &headers,
        query.to,
        query.amount,
        "GET requests should never perform state-changing operations",
    )
    .await
}

async fn secure_transfer(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let TransferRequest {
        to,
        amount,
        csrf_token,
    } = json_body(body)?;
    let outcome = blocking(move || {
        state
            .gateway()
            .transfer_strict(&session.id, amount, csrf_token.as_deref())
    })
    .await?
    .map_err(|err| transfer_error(&err))?;

    Ok(Json(TransferResponse {
        success: true,
        policy: SecurityMode::Secure.transfer_policy(),
        message: "Transfer completed securely".to_string(),
        to,
        amount,
        new_balance: outcome.new_balance,
        new_csrf_token: Some(outcome.new_token),
        csrf_token_validated: true,
        warning: None,
        request_origin: None,
        request_referer: None,
    }))
}

fn profile(
    state: &AppState,
    session: &CurrentSession,
    mode: SecurityMode,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(user) = state.gateway().sessions().resolve_or_bootstrap(&session.id) else {
        return Err(api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "user not authenticated",
            "Session has no user",
        ));
    };
    let account = state
        .store()
        .account(user)
        .map_err(|err| store_error(&err))?
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "UNKNOWN_ACCOUNT",
                format!("unknown account {user}"),
                "Session user no longer exists",
            )
        })?;

    let (session_id, message) = match mode {
        SecurityMode::Attack => (
            Some(session.id.to_string()),
            "User data readable by any origin that rides the session cookie",
        ),
        SecurityMode::Secure => (None, "Profile accessed with CSRF protection enabled"),
    };
    Ok(Json(ProfileResponse {
        username: account.username,
        email: account.email,
        balance: account.balance,
        mode,
        session_id,
        message: message.to_string(),
    }))
}

async fn attack_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<ProfileResponse>, ApiError> {
    profile(&state, &session, SecurityMode::Attack)
}

async fn secure_profile(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<ProfileResponse>, ApiError> {
    profile(&state, &session, SecurityMode::Secure)
}

/// Echo everything a cross-site caller would want to steal. Shared with the
/// XSS demo.
///
/// `remoteAddr` is null when the server was not started with connect info.
pub(super) async fn leak_session_info(
    Extension(session): Extension<CurrentSession>,
    remote: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
) -> Json<Value> {
    Json(json!({
        "sessionId": session.id,
        "sessionCreationTime": session.times.created.to_rfc3339(),
        "lastAccessedTime": session.times.last_accessed.to_rfc3339(),
        "remoteAddr": remote.map(|Extension(ConnectInfo(addr))| addr.to_string()),
        "cookies": cookies(&headers),
        "userAgent": header_text(&headers, header::USER_AGENT),
        "origin": header_text(&headers, header::ORIGIN),
        "referer": header_text(&headers, header::REFERER),
        "warning": "Session information exposed to any origin",
    }))
}

async fn secure_session_info(
    Extension(session): Extension<CurrentSession>,
    headers: HeaderMap,
) -> Json<Value> {
    Json(json!({
        "sessionId": session.id,
        "origin": header_text(&headers, header::ORIGIN),
        "message": "Session established with CSRF protection",
    }))
}
