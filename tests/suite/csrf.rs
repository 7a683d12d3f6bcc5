//! CSRF demo: token issuance, strict and permissive transfers over HTTP

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use crate::common::{EVIL_ORIGIN, TestApp, get, post_json};

const START: f64 = 10_000.0;

async fn load_secure_form(app: &TestApp, cookie: &str) -> String {
    let response = app.send(get("/api/secure/csrf/form", Some(cookie))).await;
    assert_eq!(response.status, StatusCode::OK);
    response.json["csrfToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn attack_form_issues_no_token() {
    let app = TestApp::new();
    let response = app.send(get("/api/attack/csrf/form", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json["csrfToken"].is_null());
    assert!(response.json["warning"].is_string());
}

#[tokio::test]
async fn secure_form_issues_fresh_token_each_load() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    assert_eq!(load_secure_form(&app, &cookie).await, "token-1");
    assert_eq!(load_secure_form(&app, &cookie).await, "token-2");
}

#[tokio::test]
async fn strict_transfer_rotates_token_and_rejects_replay() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let first = load_secure_form(&app, &cookie).await;

    let response = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "friend", "amount": 30.0, "csrf_token": first }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["success"], true);
    assert_eq!(response.json["policy"], "strict");
    assert_eq!(response.json["newBalance"], START - 30.0);
    assert_eq!(response.json["csrfTokenValidated"], true);
    let second = response.json["newCsrfToken"].as_str().unwrap().to_string();
    assert_ne!(second, first);

    let replay = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "friend", "amount": 30.0, "csrf_token": first }),
        ))
        .await;
    assert_eq!(replay.status, StatusCode::FORBIDDEN);
    assert_eq!(replay.json["code"], "INVALID_TOKEN");
    assert_eq!(app.balance("user1"), START - 30.0);

    let next = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "friend", "amount": 20.0, "csrf_token": second }),
        ))
        .await;
    assert_eq!(next.status, StatusCode::OK);
    assert_eq!(app.balance("user1"), START - 50.0);
}

#[tokio::test]
async fn strict_transfer_without_token_never_debits() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    load_secure_form(&app, &cookie).await;

    let response = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "attacker", "amount": 500.0 }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json["code"], "INVALID_TOKEN");
    assert_eq!(app.balance("user1"), START);
}

#[tokio::test]
async fn strict_transfer_before_any_form_load_is_rejected() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let response = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "attacker", "amount": 1.0, "csrf_token": "token-1" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.balance("user1"), START);
}

#[tokio::test]
async fn token_is_bound_to_its_session() {
    let app = TestApp::new();
    let victim = app.open_session().await;
    let attacker = app.open_session().await;
    let stolen = load_secure_form(&app, &victim).await;

    let response = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&attacker),
            &json!({ "to": "attacker", "amount": 100.0, "csrf_token": stolen }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.balance("user1"), START);
}

#[tokio::test]
async fn invalid_amount_with_valid_token_keeps_token_live() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let token = load_secure_form(&app, &cookie).await;

    let response = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "friend", "amount": -5.0, "csrf_token": token }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json["code"], "INVALID_AMOUNT");

    let retry = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "friend", "amount": 5.0, "csrf_token": token }),
        ))
        .await;
    assert_eq!(retry.status, StatusCode::OK);
    assert_eq!(app.balance("user1"), START - 5.0);
}

#[tokio::test]
async fn secure_transfer_is_post_only() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let response = app
        .send(get(
            "/api/secure/csrf/transfer?to=attacker&amount=10",
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.balance("user1"), START);
}

#[tokio::test]
async fn permissive_post_debits_without_token() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/attack/csrf/transfer")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, EVIL_ORIGIN)
        .header(header::REFERER, "http://evil.example/cat-pictures")
        .body(Body::from(
            json!({ "to": "attacker", "amount": 250.0 }).to_string(),
        ))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["policy"], "permissive");
    assert_eq!(response.json["csrfTokenValidated"], false);
    assert_eq!(response.json["newBalance"], START - 250.0);
    assert_eq!(response.json["requestOrigin"], EVIL_ORIGIN);
    assert_eq!(
        response.json["requestReferer"],
        "http://evil.example/cat-pictures"
    );
    assert!(response.json.get("newCsrfToken").is_none());
}

#[tokio::test]
async fn permissive_get_debits_from_query_string() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let response = app
        .send(get(
            "/api/attack/csrf/transfer?to=attacker&amount=100",
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["to"], "attacker");
    assert_eq!(app.balance("user1"), START - 100.0);
}

#[tokio::test]
async fn permissive_ignores_tokens_entirely() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let response = app
        .send(post_json(
            "/api/attack/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "attacker", "amount": 10.0, "csrf_token": "forged" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.balance("user1"), START - 10.0);
}

#[tokio::test]
async fn permissive_allows_overdraft() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let response = app
        .send(post_json(
            "/api/attack/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "attacker", "amount": START + 1.0 }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["newBalance"], -1.0);
}

#[tokio::test]
async fn debit_past_f64_range_is_refused_not_reported_as_success() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let drain = || {
        post_json(
            "/api/attack/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "attacker", "amount": 1.7e308 }),
        )
    };

    let first = app.send(drain()).await;
    assert_eq!(first.status, StatusCode::OK);
    assert!(first.json["newBalance"].is_f64());

    let second = app.send(drain()).await;
    assert_eq!(second.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(second.json["code"], "BALANCE_OUT_OF_RANGE");
    assert!(second.json.get("success").is_none());

    let profile = app.send(get("/api/secure/csrf/profile", Some(&cookie))).await;
    assert!(profile.json["balance"].as_f64().unwrap().is_finite());
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = TestApp::new();
    let cookie = app.open_session().await;

    let response = app
        .send(post_json(
            "/api/attack/csrf/transfer",
            Some(&cookie),
            &json!({ "to": "attacker", "amount": "lots" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["code"], "MALFORMED_REQUEST");

    let response = app
        .send(get("/api/attack/csrf/transfer?to=attacker", Some(&cookie)))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["code"], "MALFORMED_REQUEST");
    assert_eq!(app.balance("user1"), START);
}

#[tokio::test]
async fn sessions_without_user_are_unauthenticated() {
    let app = TestApp::without_victim();
    let cookie = app.open_session().await;

    let permissive = app
        .send(post_json(
            "/api/attack/csrf/transfer",
            Some(&cookie),
            &json!({ "amount": 10.0 }),
        ))
        .await;
    assert_eq!(permissive.status, StatusCode::UNAUTHORIZED);
    assert_eq!(permissive.json["code"], "UNAUTHENTICATED");

    let token = load_secure_form(&app, &cookie).await;
    let strict = app
        .send(post_json(
            "/api/secure/csrf/transfer",
            Some(&cookie),
            &json!({ "amount": 10.0, "csrf_token": token }),
        ))
        .await;
    assert_eq!(strict.status, StatusCode::UNAUTHORIZED);

    let profile = app.send(get("/api/secure/csrf/profile", Some(&cookie))).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profiles_show_live_balance() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    app.send(get(
        "/api/attack/csrf/transfer?to=attacker&amount=40",
        Some(&cookie),
    ))
    .await;

    let secure = app.send(get("/api/secure/csrf/profile", Some(&cookie))).await;
    assert_eq!(secure.status, StatusCode::OK);
    assert_eq!(secure.json["username"], "user1");
    assert_eq!(secure.json["balance"], START - 40.0);
    assert_eq!(secure.json["mode"], "secure");
    assert!(secure.json.get("sessionId").is_none());

    let attack = app.send(get("/api/attack/csrf/profile", Some(&cookie))).await;
    assert_eq!(attack.json["mode"], "attack");
    assert!(attack.json["sessionId"].is_string());
}

#[tokio::test]
async fn attack_session_info_leaks_cookies() {
    let app = TestApp::new();
    let cookie = app.open_session().await;
    let session_id = cookie.trim_start_matches("SESSIONID=").to_string();
    let peer: SocketAddr = "203.0.113.7:51234".parse().unwrap();

    let mut request = get("/api/attack/csrf/session-info", Some(&cookie));
    request.extensions_mut().insert(ConnectInfo(peer));
    let attack = app.send(request).await;
    assert_eq!(attack.json["sessionId"], session_id.as_str());
    assert_eq!(attack.json["cookies"]["SESSIONID"], session_id.as_str());
    assert_eq!(attack.json["remoteAddr"], "203.0.113.7:51234");
    // The only earlier request was the one that created the session.
    let created = attack.json["sessionCreationTime"].as_str().unwrap();
    assert_eq!(attack.json["lastAccessedTime"], created);

    let again = app
        .send(get("/api/attack/csrf/session-info", Some(&cookie)))
        .await;
    assert_eq!(again.json["sessionCreationTime"], created);
    assert!(again.json["lastAccessedTime"].is_string());
    assert!(again.json["remoteAddr"].is_null());

    let secure = app
        .send(get("/api/secure/csrf/session-info", Some(&cookie)))
        .await;
    assert_eq!(secure.json["sessionId"], session_id.as_str());
    assert!(secure.json.get("cookies").is_none());
    assert!(secure.json.get("remoteAddr").is_none());
}
