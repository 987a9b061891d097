use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use parlor_server::{app, AppState};
use parlor_voice::{LiveKitConfig, VoiceService};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const LK_URL: &str = "ws://localhost:7880";
const API_KEY: &str = "devkey";
const API_SECRET: &str = "devsecret";

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    video: VideoClaims,
}

#[derive(Debug, Deserialize)]
struct VideoClaims {
    #[serde(rename = "roomJoin")]
    room_join: bool,
    room: String,
    #[serde(rename = "canPublish")]
    can_publish: bool,
    #[serde(rename = "canSubscribe")]
    can_subscribe: bool,
}

fn setup_app() -> axum::Router {
    let config = LiveKitConfig::new(LK_URL, API_KEY, API_SECRET);
    app(AppState::new(Arc::new(VoiceService::new(config))))
}

async fn post_token(body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri("/token")
        .method("POST")
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    let response = setup_app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn decode_token(json: &Value) -> Claims {
    let token = json["token"].as_str().expect("token should be a string");
    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(API_SECRET.as_bytes());
    decode::<Claims>(token, &key, &validation)
        .expect("token should verify with the API secret")
        .claims
}

#[tokio::test]
async fn test_token_defaults_room_and_identity() {
    let (status, json) = post_token(Body::from("{}")).await;
    assert_eq!(status, StatusCode::OK);

    let claims = decode_token(&json);
    let pattern = Regex::new(r"^user-\d{6}$").unwrap();
    assert!(
        pattern.is_match(&claims.sub),
        "identity '{}' should match user-HHMMSS",
        claims.sub
    );
    assert_eq!(claims.video.room, "default");
    assert!(claims.video.room_join);
}

#[tokio::test]
async fn test_token_with_explicit_room_and_identity() {
    let (status, json) = post_token(Body::from(r#"{"room":"r1","identity":"alice"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let claims = decode_token(&json);
    assert_eq!(claims.sub, "alice");
    assert!(claims.video.room_join);
    assert_eq!(claims.video.room, "r1");
    assert!(claims.video.can_publish);
    assert!(claims.video.can_subscribe);
}

#[tokio::test]
async fn test_token_with_empty_body_defaults() {
    let (status, json) = post_token(Body::empty()).await;
    assert_eq!(status, StatusCode::OK);

    let claims = decode_token(&json);
    assert!(claims.sub.starts_with("user-"));
    assert_eq!(claims.video.room, "default");
}

#[tokio::test]
async fn test_token_with_malformed_body_defaults() {
    let (status, json) = post_token(Body::from("{room: oops")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_token(&json).video.room, "default");
}

#[tokio::test]
async fn test_token_keeps_identity_as_sent() {
    let (status, json) = post_token(Body::from(r#"{"identity":" alice "}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_token(&json).sub, " alice ");
}

#[tokio::test]
async fn test_token_with_only_room() {
    let (status, json) = post_token(Body::from(r#"{"room":"standup"}"#)).await;
    assert_eq!(status, StatusCode::OK);

    let claims = decode_token(&json);
    assert_eq!(claims.video.room, "standup");
    assert!(Regex::new(r"^user-\d{6}$").unwrap().is_match(&claims.sub));
}

#[tokio::test]
async fn test_token_rejects_get() {
    let response = setup_app()
        .oneshot(Request::builder().uri("/token").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_returns_ok() {
    let response = setup_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
