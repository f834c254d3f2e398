//! Integration tests for the CORS allow-list and origin guard.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{
    Method, Request, StatusCode,
    header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
    },
};
use serde_json::json;
use shop_bridge_integration_tests::{
    FRONTEND_ORIGIN, body_json, get, memory_app, router_with, send, test_config,
};
use shop_bridge_server::db::MemoryStore;

fn get_from(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

fn preflight(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .header(ORIGIN, origin)
        .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Allowed Origins
// =============================================================================

#[tokio::test]
async fn test_frontend_origin_is_allowed_with_credentials() {
    let (router, _store) = memory_app(None);

    let response = send(&router, get_from("/health", FRONTEND_ORIGIN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        FRONTEND_ORIGIN
    );
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_shopify_admin_origin_is_allowed() {
    let (router, _store) = memory_app(None);

    let response = send(&router, get_from("/health", "https://admin.shopify.com")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://admin.shopify.com"
    );
}

#[tokio::test]
async fn test_configured_frontend_replaces_default() {
    let router = router_with(
        test_config(None, &[("FRONTEND_URL", "https://app.example.com")]),
        Arc::new(MemoryStore::new()),
    );

    let allowed = send(&router, get_from("/health", "https://app.example.com")).await;
    assert_eq!(allowed.status(), StatusCode::OK);

    let default = send(&router, get_from("/health", FRONTEND_ORIGIN)).await;
    assert_eq!(default.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_preflight_from_allowed_origin() {
    let (router, _store) = memory_app(None);

    let response = send(&router, preflight("/health", FRONTEND_ORIGIN)).await;

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        FRONTEND_ORIGIN
    );
}

#[tokio::test]
async fn test_request_without_origin_passes() {
    let (router, _store) = memory_app(None);

    let response = send(&router, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

// =============================================================================
// Rejected Origins
// =============================================================================

#[tokio::test]
async fn test_unlisted_origin_is_rejected() {
    let (router, _store) = memory_app(None);

    let response = send(&router, get_from("/health", "https://evil.example")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Internal Server Error",
            "message": "Not allowed by CORS"
        })
    );
}

#[tokio::test]
async fn test_unlisted_origin_detail_hidden_in_production() {
    let router = router_with(
        test_config(None, &[("NODE_ENV", "production")]),
        Arc::new(MemoryStore::new()),
    );

    let response = send(&router, get_from("/health", "https://evil.example")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn test_preflight_from_unlisted_origin_is_rejected() {
    let (router, _store) = memory_app(None);

    let response = send(&router, preflight("/auth/callback", "https://evil.example")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
