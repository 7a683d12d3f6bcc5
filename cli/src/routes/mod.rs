mod csrf;
mod sql;
mod xss;

use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use securescape_types::SecurityMode;
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, api_error};
use crate::session::ensure_session;
use crate::state::AppState;

/// Attack family: any origin, credentials included.
fn attack_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Secure family: configured origins only. Unparseable entries are dropped.
fn secure_cors(allowed_origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Header value as text, if present and printable.
pub(crate) fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Run synchronous ledger work on the blocking pool. The strict path holds
/// the token lock across a SQLite write.
pub(crate) async fn blocking<R>(work: impl FnOnce() -> R + Send + 'static) -> Result<R, ApiError>
where
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        tracing::error!(error = %err, "Blocking transfer task failed");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TASK_FAILED",
            err.to_string(),
            "Transfer could not be completed",
        )
    })
}

#[must_use]
pub fn build_router(state: AppState) -> Router {
    let attack = Router::new()
        .merge(csrf::attack_routes())
        .merge(sql::attack_routes())
        .merge(xss::attack_routes())
        .layer(attack_cors());

    let secure = Router::new()
        .merge(csrf::secure_routes())
        .merge(sql::secure_routes())
        .merge(xss::secure_routes())
        .layer(secure_cors(state.allowed_origins()));

    Router::new()
        .route("/api/health", get(health))
        .nest(SecurityMode::Attack.route_prefix(), attack)
        .nest(SecurityMode::Secure.route_prefix(), secure)
        .layer(middleware::from_fn_with_state(state.clone(), ensure_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
