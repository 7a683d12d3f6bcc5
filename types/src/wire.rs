//! JSON request and response bodies exchanged with the browser client.
//!
//! Field names follow what the client already sends and reads: request
//! bodies keep `csrf_token`, responses use camelCase.

use serde::{Deserialize, Serialize};

use crate::{CsrfToken, SecurityMode, TransferPolicy};

/// Body of `POST .../csrf/transfer`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub to: Option<String>,
    pub amount: f64,
    /// Only read by the secure route.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Query string of the read-style `GET .../csrf/transfer`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferQuery {
    #[serde(default)]
    pub to: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    /// `None` on the attack route, which never issues a token.
    pub csrf_token: Option<CsrfToken>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub success: bool,
    pub policy: TransferPolicy,
    pub message: String,
    pub to: Option<String>,
    pub amount: f64,
    pub new_balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_csrf_token: Option<CsrfToken>,
    pub csrf_token_validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_referer: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub balance: f64,
    pub mode: SecurityMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub message: String,
}

/// Uniform error body. `code` is stable and machine-readable; `message` is
/// for humans and may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
    /// Only present on the attack route, to show what was executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_query: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: String,
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<Product>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_query: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: String,
}
