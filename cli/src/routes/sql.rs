//! SQL injection demo: the same login and search, concatenated vs bound.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use securescape_store::{PARAMETERIZED_SEARCH_SQL, StoreError};
use securescape_types::wire::{
    LoginRequest, LoginResponse, SearchQuery, SearchResponse, UserInfo,
};

use crate::error::{ApiError, api_error, json_body, query_params, store_error};
use crate::state::AppState;

pub(super) fn attack_routes() -> Router<AppState> {
    Router::new()
        .route("/sql/login", post(attack_login))
        .route("/sql/search", get(attack_search))
}

pub(super) fn secure_routes() -> Router<AppState> {
    Router::new()
        .route("/sql/login", post(secure_login))
        .route("/sql/search", get(secure_search))
}

/// A malformed injected statement is the attacker's problem, not a server
/// fault. The driver message is returned as-is, which is itself a leak.
fn injected_sql_error(err: &StoreError, sql_hint: &str) -> ApiError {
    match err {
        StoreError::Sqlite(source) => {
            tracing::warn!(error = %source, "Concatenated query failed");
            api_error(
                StatusCode::BAD_REQUEST,
                "SQL_ERROR",
                source.to_string(),
                format!("Query failed: {sql_hint}"),
            )
        }
        StoreError::Path { .. } => store_error(err),
    }
}

fn invalid_credentials() -> ApiError {
    api_error(
        StatusCode::UNAUTHORIZED,
        "INVALID_CREDENTIALS",
        "invalid credentials",
        "Invalid username or password",
    )
}

fn logged_in(user: UserInfo, executed_query: Option<String>) -> Json<LoginResponse> {
    tracing::info!(user = %user.username, "Demo login succeeded");
    Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        user: Some(user),
        executed_query,
    })
}

async fn attack_login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = json_body(body)?;
    let attempt = state
        .store()
        .login_concatenated(&request.username, &request.password)
        .map_err(|err| injected_sql_error(&err, "login"))?;
    match attempt.user {
        Some(user) => Ok(logged_in(user, Some(attempt.sql))),
        None => Err(invalid_credentials()),
    }
}

async fn secure_login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = json_body(body)?;
    let user = state
        .store()
        .login_parameterized(&request.username, &request.password)
        .map_err(|err| store_error(&err))?;
    user.map(|user| logged_in(user, None))
        .ok_or_else(invalid_credentials)
}

async fn attack_search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = query_params(query)?;
    let outcome = state
        .store()
        .search_concatenated(&query.q)
        .map_err(|err| injected_sql_error(&err, "search"))?;
    Ok(Json(SearchResponse {
        count: outcome.products.len(),
        results: outcome.products,
        executed_query: Some(outcome.sql),
    }))
}

async fn secure_search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = query_params(query)?;
    let products = state
        .store()
        .search_parameterized(&query.q)
        .map_err(|err| store_error(&err))?;
    Ok(Json(SearchResponse {
        count: products.len(),
        results: products,
        executed_query: Some(PARAMETERIZED_SEARCH_SQL.to_string()),
    }))
}
