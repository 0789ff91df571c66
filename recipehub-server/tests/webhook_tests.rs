//! LiveKit webhook endpoint tests
//!
//! Deliveries are signed with the test credentials from the helpers module.

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use recipehub_common::config::ChatConfig;
use recipehub_server::db::live_sessions;
use recipehub_server::services::llm::FakeProvider;
use recipehub_server::{build_router, AppState};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt;

fn app(db: SqlitePool) -> axum::Router {
    build_router(test_state(
        db,
        Arc::new(FakeRecipeSource::new()),
        None,
        Arc::new(FakeProvider::new()),
    ))
}

async fn deliver(app: &axum::Router, body: serde_json::Value) -> StatusCode {
    let body = body.to_string();
    let token = sign_webhook(LIVEKIT_KEY, LIVEKIT_SECRET, body.as_bytes());
    let response = app
        .clone()
        .oneshot(webhook_request(&body, Some(&token)))
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_session_lifecycle() {
    let db = test_db().await;
    let app = app(db.clone());

    let room = json!({ "name": "sunday-pasta" });
    assert_eq!(deliver(&app, json!({ "event": "room_started", "room": room })).await, StatusCode::OK);
    for identity in ["ana", "ben", "cy"] {
        let status = deliver(
            &app,
            json!({ "event": "participant_joined", "room": room, "participant": { "identity": identity } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    deliver(&app, json!({ "event": "participant_left", "room": room })).await;

    let session = live_sessions::find_by_room(&db, "sunday-pasta").await.unwrap().unwrap();
    assert_eq!(session.viewer_count, 2);
    assert_eq!(session.max_viewers, 3);

    deliver(
        &app,
        json!({
            "event": "egress_started",
            "egressInfo": { "egressId": "EG_1", "roomName": "sunday-pasta" }
        }),
    )
    .await;
    deliver(
        &app,
        json!({
            "event": "egress_ended",
            "egressInfo": {
                "egressId": "EG_1",
                "roomName": "sunday-pasta",
                "fileResults": [{ "location": "s3://recordings/sunday-pasta.mp4" }]
            }
        }),
    )
    .await;
    deliver(&app, json!({ "event": "room_finished", "room": room })).await;

    let session = live_sessions::find_by_room(&db, "sunday-pasta").await.unwrap().unwrap();
    assert_eq!(session.recording_id.as_deref(), Some("EG_1"));
    assert_eq!(session.recording_url.as_deref(), Some("s3://recordings/sunday-pasta.mp4"));
    assert!(session.recording_started_at.is_some());
    assert!(session.ended_at.is_some());
}

#[tokio::test]
async fn test_unknown_event_and_room_are_acknowledged() {
    let db = test_db().await;
    let app = app(db.clone());

    let status = deliver(&app, json!({ "event": "track_published", "room": { "name": "x" } })).await;
    assert_eq!(status, StatusCode::OK);

    let status = deliver(&app, json!({ "event": "participant_joined", "room": { "name": "ghost" } })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(live_sessions::find_by_room(&db, "ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rejects_unsigned_and_forged_deliveries() {
    let db = test_db().await;
    live_sessions::ensure_session(&db, "kitchen", "kitchen").await.unwrap();
    let app = app(db.clone());

    let body = json!({ "event": "participant_joined", "room": { "name": "kitchen" } }).to_string();

    let response = app.clone().oneshot(webhook_request(&body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let forged = sign_webhook(LIVEKIT_KEY, "wrong-secret", body.as_bytes());
    let response = app.clone().oneshot(webhook_request(&body, Some(&forged))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid token for a different body
    let token = sign_webhook(LIVEKIT_KEY, LIVEKIT_SECRET, body.as_bytes());
    let tampered = body.replace("kitchen", "kitchen ");
    let response = app.clone().oneshot(webhook_request(&tampered, Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong_issuer = sign_webhook("APIother", LIVEKIT_SECRET, body.as_bytes());
    let response = app.oneshot(webhook_request(&body, Some(&wrong_issuer))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let session = live_sessions::find_by_room(&db, "kitchen").await.unwrap().unwrap();
    assert_eq!(session.viewer_count, 0);
}

#[tokio::test]
async fn test_bearer_prefix_is_accepted() {
    let db = test_db().await;
    let app = app(db);

    let body = json!({ "event": "room_started", "room": { "name": "bearer-room" } }).to_string();
    let token = format!("Bearer {}", sign_webhook(LIVEKIT_KEY, LIVEKIT_SECRET, body.as_bytes()));

    let (status, response) = read_json(app.oneshot(webhook_request(&body, Some(&token))).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["received"], true);
}

#[tokio::test]
async fn test_unconfigured_verifier_is_server_error() {
    let app = build_router(AppState::new(test_db().await, &ChatConfig::default()));

    let body = json!({ "event": "room_started", "room": { "name": "r" } }).to_string();
    let token = sign_webhook(LIVEKIT_KEY, LIVEKIT_SECRET, body.as_bytes());
    let response = app.oneshot(webhook_request(&body, Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_signed_but_malformed_body_is_400() {
    let app = app(test_db().await);

    let body = "{not json";
    let token = sign_webhook(LIVEKIT_KEY, LIVEKIT_SECRET, body.as_bytes());
    let response = app.oneshot(webhook_request(body, Some(&token))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
