//! SQL injection demo: concatenated vs parameterized login and search

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{TestApp, get, post_json};

const TAUTOLOGY: &str = "' OR '1'='1' --";

#[tokio::test]
async fn both_logins_accept_real_credentials() {
    let app = TestApp::new();
    for uri in ["/api/attack/sql/login", "/api/secure/sql/login"] {
        let response = app
            .send(post_json(
                uri,
                None,
                &json!({ "username": "john", "password": "john123" }),
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        assert_eq!(response.json["user"]["username"], "john");
        assert!(response.json["user"].get("password").is_none());
    }
}

#[tokio::test]
async fn tautology_logs_in_as_admin_on_attack_route() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            "/api/attack/sql/login",
            None,
            &json!({ "username": TAUTOLOGY, "password": "whatever" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["user"]["username"], "admin");
    assert_eq!(response.json["user"]["role"], "ADMIN");
    assert!(
        response.json["executedQuery"]
            .as_str()
            .unwrap()
            .contains(TAUTOLOGY)
    );
}

#[tokio::test]
async fn tautology_is_just_a_wrong_username_on_secure_route() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            "/api/secure/sql/login",
            None,
            &json!({ "username": TAUTOLOGY, "password": "whatever" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn broken_quote_leaks_driver_error_on_attack_route() {
    let app = TestApp::new();
    let response = app
        .send(post_json(
            "/api/attack/sql/login",
            None,
            &json!({ "username": "'", "password": "x" }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json["code"], "SQL_ERROR");
}

#[tokio::test]
async fn search_lists_released_products() {
    let app = TestApp::new();
    for uri in ["/api/attack/sql/search?q=o", "/api/secure/sql/search?q=o"] {
        let response = app.send(get(uri, None)).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        assert_eq!(response.json["count"], 3);
        let names: Vec<_> = response.json["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|product| product["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Laptop", "Mouse", "Keyboard"]);
    }
}

#[tokio::test]
async fn injected_search_exposes_unreleased_products() {
    let app = TestApp::new();
    let attack = app
        .send(get("/api/attack/sql/search?q=x%27%20OR%201%3D1%20--", None))
        .await;
    assert_eq!(attack.status, StatusCode::OK);
    assert_eq!(attack.json["count"], 5);

    let secure = app
        .send(get("/api/secure/sql/search?q=x%27%20OR%201%3D1%20--", None))
        .await;
    assert_eq!(secure.status, StatusCode::OK);
    assert_eq!(secure.json["count"], 0);
    assert!(
        secure.json["executedQuery"]
            .as_str()
            .unwrap()
            .contains("?1")
    );
}
