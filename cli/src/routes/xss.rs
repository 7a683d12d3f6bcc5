//! Stored and reflected XSS demo over one shared comment board.
//!
//! Rows are stored as submitted. The attack family returns them raw; the
//! secure family escapes every row on the way out, including rows that were
//! posted through the attack family.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use securescape_types::wire::{Comment, CommentRequest, SearchQuery};
use securescape_types::{MAX_COMMENT_CHARS, escape_html};
use serde_json::{Value, json};

use crate::error::{ApiError, api_error, json_body, query_params, store_error};
use crate::routes::csrf::leak_session_info;
use crate::state::AppState;

pub(super) fn attack_routes() -> Router<AppState> {
    Router::new()
        .route("/xss/comments", get(attack_comments))
        .route("/xss/comment", post(attack_comment))
        .route("/xss/search", get(attack_search))
        .route("/xss/session-info", get(leak_session_info))
}

pub(super) fn secure_routes() -> Router<AppState> {
    Router::new()
        .route("/xss/comments", get(secure_comments))
        .route("/xss/comment", post(secure_comment))
        .route("/xss/search", get(secure_search))
}

fn escaped(comment: Comment) -> Comment {
    Comment {
        text: escape_html(&comment.text).into_owned(),
        ..comment
    }
}

async fn attack_comments(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let comments = state.store().comments().map_err(|err| store_error(&err))?;
    Ok(Json(json!({
        "comments": comments,
        "warning": "Comments are returned without HTML encoding",
    })))
}

async fn secure_comments(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let comments: Vec<Comment> = state
        .store()
        .comments()
        .map_err(|err| store_error(&err))?
        .into_iter()
        .map(escaped)
        .collect();
    Ok(Json(json!({
        "comments": comments,
        "message": "Comments are HTML encoded",
    })))
}

async fn attack_comment(
    State(state): State<AppState>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(body)?;
    let comment = state
        .store()
        .add_comment(&request.text)
        .map_err(|err| store_error(&err))?;
    Ok(Json(json!({
        "success": true,
        "comment": comment,
        "message": "Comment added without sanitization",
    })))
}

async fn secure_comment(
    State(state): State<AppState>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(body)?;
    if request.text.trim().is_empty() {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "EMPTY_COMMENT",
            "comment is empty",
            "Write something before posting",
        ));
    }
    let chars = request.text.chars().count();
    if chars > MAX_COMMENT_CHARS {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "COMMENT_TOO_LONG",
            format!("comment is {chars} characters"),
            format!("Comments are limited to {MAX_COMMENT_CHARS} characters"),
        ));
    }

    let comment = state
        .store()
        .add_comment(&request.text)
        .map_err(|err| store_error(&err))?;
    Ok(Json(json!({
        "success": true,
        "comment": escaped(comment),
        "message": "Comment added (HTML encoded on display)",
    })))
}

async fn attack_search(
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let SearchQuery { q } = query_params(query)?;
    Ok(Json(json!({
        "results": format!("Search results for: {q}"),
        "query": q,
        "warning": "Query is reflected without encoding",
    })))
}

async fn secure_search(
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let SearchQuery { q } = query_params(query)?;
    let q = escape_html(&q);
    Ok(Json(json!({
        "results": format!("Search results for: {q}"),
        "query": q,
    })))
}
