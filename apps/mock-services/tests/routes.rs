use std::collections::HashSet;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use relay_mock_services::{MockState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn call(router: &axum::Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn router() -> axum::Router {
    build_router(MockState::new(HashSet::from([42])))
}

#[tokio::test]
async fn supabase_lookup_follows_authorized_ids() {
    let router = router();

    let (status, body) = call(
        &router,
        Method::GET,
        "/rest/v1/users?select=id&telegram_id=eq.42",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 42);

    let (status, body) = call(
        &router,
        Method::GET,
        "/rest/v1/users?select=id&telegram_id=eq.7",
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["code"], "PGRST116");
}

#[tokio::test]
async fn bot_service_echoes_text() {
    let (status, body) = call(
        &router(),
        Method::POST,
        "/process-message",
        json!({ "userId": 42, "text": "coffee 5" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success", "message": "Received: coffee 5" }));
}

#[tokio::test]
async fn telegram_webhook_state_round_trips() {
    let router = router();

    let (_, info) = call(&router, Method::GET, "/bot123:abc/getWebhookInfo", Value::Null).await;
    assert_eq!(info["result"]["url"], "");

    let (status, set) = call(
        &router,
        Method::POST,
        "/bot123:abc/setWebhook",
        json!({ "url": "https://relay.example.com/webhook", "allowed_updates": ["message"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(set["ok"], true);

    let (_, info) = call(&router, Method::GET, "/bot123:abc/getWebhookInfo", Value::Null).await;
    assert_eq!(info["result"]["url"], "https://relay.example.com/webhook");
}

#[tokio::test]
async fn telegram_send_message_and_unknown_routes() {
    let router = router();

    let (status, sent) = call(
        &router,
        Method::POST,
        "/bot123:abc/sendMessage",
        json!({ "chat_id": 42, "text": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["result"]["chat"]["id"], 42);

    let (status, body) = call(&router, Method::POST, "/bot123:abc/sendSticker", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);

    let (status, _) = call(&router, Method::POST, "/nobot/sendMessage", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
