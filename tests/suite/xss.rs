//! XSS demo: shared comment board, raw vs escaped rendering

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{TestApp, get, post_json};

const PAYLOAD: &str = "<img src=x onerror=alert(document.cookie)>";
const ESCAPED: &str = "&lt;img src=x onerror=alert(document.cookie)&gt;";

fn first_comment(json: &Value) -> &str {
    json["comments"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn seeded_comments_are_listed() {
    let app = TestApp::new();
    let response = app.send(get("/api/secure/xss/comments", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["comments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn stored_payload_is_raw_on_attack_and_escaped_on_secure() {
    let app = TestApp::new();
    let posted = app
        .send(post_json(
            "/api/attack/xss/comment",
            None,
            &json!({ "text": PAYLOAD }),
        ))
        .await;
    assert_eq!(posted.status, StatusCode::OK);
    assert_eq!(posted.json["comment"]["text"], PAYLOAD);

    let attack = app.send(get("/api/attack/xss/comments", None)).await;
    assert_eq!(first_comment(&attack.json), PAYLOAD);

    let secure = app.send(get("/api/secure/xss/comments", None)).await;
    assert_eq!(first_comment(&secure.json), ESCAPED);
}

#[tokio::test]
async fn secure_post_echoes_escaped_text() {
    let app = TestApp::new();
    let posted = app
        .send(post_json(
            "/api/secure/xss/comment",
            None,
            &json!({ "text": PAYLOAD }),
        ))
        .await;
    assert_eq!(posted.status, StatusCode::OK);
    assert_eq!(posted.json["comment"]["text"], ESCAPED);

    // One escape on the way out, never two.
    let secure = app.send(get("/api/secure/xss/comments", None)).await;
    assert_eq!(first_comment(&secure.json), ESCAPED);
}

#[tokio::test]
async fn secure_post_rejects_empty_and_oversized_comments() {
    let app = TestApp::new();

    let empty = app
        .send(post_json(
            "/api/secure/xss/comment",
            None,
            &json!({ "text": "   " }),
        ))
        .await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(empty.json["code"], "EMPTY_COMMENT");

    let long = "a".repeat(1001);
    let oversized = app
        .send(post_json(
            "/api/secure/xss/comment",
            None,
            &json!({ "text": long }),
        ))
        .await;
    assert_eq!(oversized.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(oversized.json["code"], "COMMENT_TOO_LONG");

    let at_limit = app
        .send(post_json(
            "/api/secure/xss/comment",
            None,
            &json!({ "text": "a".repeat(1000) }),
        ))
        .await;
    assert_eq!(at_limit.status, StatusCode::OK);
}

#[tokio::test]
async fn reflected_search_escapes_only_on_secure_route() {
    let app = TestApp::new();
    let uri = "/api/attack/xss/search?q=%3Cscript%3Ealert(1)%3C%2Fscript%3E";
    let attack = app.send(get(uri, None)).await;
    assert_eq!(attack.json["query"], "<script>alert(1)</script>");

    let uri = "/api/secure/xss/search?q=%3Cscript%3Ealert(1)%3C%2Fscript%3E";
    let secure = app.send(get(uri, None)).await;
    assert_eq!(
        secure.json["query"],
        "&lt;script&gt;alert(1)&lt;/script&gt;"
    );
    assert!(secure.json.get("warning").is_none());
}

#[tokio::test]
async fn attack_session_info_exposes_cookies_to_scripts() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let response = app
        .send(get("/api/attack/xss/session-info", Some(&cookie)))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json["cookies"]["SESSIONID"].is_string());
    assert!(response.json["sessionCreationTime"].is_string());

    let secure = app
        .send(get("/api/secure/xss/session-info", Some(&cookie)))
        .await;
    assert_eq!(secure.status, StatusCode::NOT_FOUND);
}
