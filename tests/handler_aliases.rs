mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use lndr_sync::domain::entities::{AliasRecord, RESERVED_SOURCE};
use serde_json::{Value, json};

#[tokio::test]
async fn test_list_namespace_aliases() {
    let app = common::create_test_app(
        vec![
            AliasRecord::new(1, "/lndr/42", "/p1"),
            AliasRecord::new(2, RESERVED_SOURCE, "/soon"),
            AliasRecord::new(3, "/node/7", "/about"),
        ],
        Vec::new(),
    );
    let server = TestServer::new(common::test_router(app.state)).unwrap();

    let response = server
        .get("/api/aliases")
        .authorization_bearer(common::ADMIN_TOKEN)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["total"], 2);
    assert_eq!(json["placeholders"], 1);
    assert_eq!(json["items"][0]["project_id"], "42");
    assert_eq!(json["items"][1]["placeholder"], true);
    assert!(json["items"][1]["project_id"].is_null());
}

#[tokio::test]
async fn test_reserve_alias() {
    let app = common::create_test_app(Vec::new(), Vec::new());
    let store = app.store.clone();
    let server = TestServer::new(common::test_router(app.state)).unwrap();

    let response = server
        .post("/api/reservations")
        .authorization_bearer(common::ADMIN_TOKEN)
        .json(&json!({ "alias": "/spring-campaign" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["alias"], "/spring-campaign");
    assert_eq!(json["source"], "/lndr/reserved");

    let records = store.snapshot().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].is_placeholder());
}

#[tokio::test]
async fn test_reserve_taken_alias_conflicts() {
    let app = common::create_test_app(
        vec![AliasRecord::new(1, "/node/7", "/about")],
        Vec::new(),
    );
    let server = TestServer::new(common::test_router(app.state)).unwrap();

    let response = server
        .post("/api/reservations")
        .authorization_bearer(common::ADMIN_TOKEN)
        .json(&json!({ "alias": "/about" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_reserve_invalid_alias() {
    let app = common::create_test_app(Vec::new(), Vec::new());
    let server = TestServer::new(common::test_router(app.state)).unwrap();

    for alias in ["no-leading-slash", "//evil.test", "/with space", "/"] {
        let response = server
            .post("/api/reservations")
            .authorization_bearer(common::ADMIN_TOKEN)
            .json(&json!({ "alias": alias }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["error"]["code"],
            "validation_error"
        );
    }
}

#[tokio::test]
async fn test_reserved_alias_is_promoted_by_next_sync() {
    let app = common::create_test_app(
        Vec::new(),
        vec![common::project(42, "https://site.test/launch")],
    );
    let store = app.store.clone();
    let server = TestServer::new(common::test_router(app.state)).unwrap();

    let reserved = server
        .post("/api/reservations")
        .authorization_bearer(common::ADMIN_TOKEN)
        .json(&json!({ "alias": "/launch" }))
        .await
        .json::<Value>();

    server
        .post("/api/sync")
        .authorization_bearer(common::ADMIN_TOKEN)
        .await
        .assert_status_ok();

    let records = store.snapshot().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].pid, reserved["pid"].as_i64().unwrap());
    assert_eq!(records[0].source, "/lndr/42");
}
