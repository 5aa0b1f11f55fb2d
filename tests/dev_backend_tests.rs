// Integration tests for the development backend router
//
// Requests are driven through the router with `oneshot`, no socket needed.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot
use voice_interview::config::LiveKitConfig;
use voice_interview::http::{create_router, default_outline, AppState};

fn livekit() -> LiveKitConfig {
    LiveKitConfig::new(
        "ws://127.0.0.1:7880",
        "devkey",
        "devsecret-devsecret-devsecret-00",
    )
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    Ok((status, body))
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let app = create_router(AppState::default());
    let request = Request::builder().uri("/health").body(Body::empty())?;

    let (status, body) = send(app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_start_interview_requires_name_and_email() -> Result<()> {
    let app = create_router(AppState::default());

    let (status, body) = send(
        app,
        post_json("/api/start/interview", json!({ "name": "Ada", "email": "  " })),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Name and email are required");
    Ok(())
}

#[tokio::test]
async fn test_start_interview_rejects_invalid_email() -> Result<()> {
    let app = create_router(AppState::default());

    let (status, body) = send(
        app,
        post_json(
            "/api/start/interview",
            json!({ "name": "Ada", "email": "ada..l@example.com" }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email address cannot contain consecutive dots");
    Ok(())
}

#[tokio::test]
async fn test_start_interview_records_interview() -> Result<()> {
    let state = AppState::default();
    let app = create_router(state.clone());

    let (status, body) = send(
        app,
        post_json(
            "/api/start/interview",
            json!({ "name": "Ada", "email": "ada@example.com" }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let interviewee_id = body["data"]["intervieweeId"].as_str().unwrap_or_default();
    let response_id = body["data"]["responseId"].as_str().unwrap_or_default();
    assert!(!interviewee_id.is_empty());
    assert!(!response_id.is_empty());

    let interviews = state.interviews.read().await;
    let record = &interviews[response_id];
    assert_eq!(record.interviewee_id, interviewee_id);
    assert_eq!(record.email, "ada@example.com");
    assert!(record.ended_at.is_none());
    Ok(())
}

#[tokio::test]
async fn test_end_interview_validates_body() -> Result<()> {
    let app = create_router(AppState::default());

    let (status, _) = send(
        app.clone(),
        post_json("/api/interview/end", json!({ "responseId": "r1", "messages": [] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app,
        post_json(
            "/api/interview/end",
            json!({ "intervieweeId": "i1", "responseId": "r1", "messages": "none" }),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "messages must be an array");
    Ok(())
}

#[tokio::test]
async fn test_end_interview_stores_messages() -> Result<()> {
    let state = AppState::default();
    let app = create_router(state.clone());

    let (_, started) = send(
        app.clone(),
        post_json(
            "/api/start/interview",
            json!({ "name": "Ada", "email": "ada@example.com" }),
        ),
    )
    .await?;
    let data = &started["data"];

    let (status, body) = send(
        app,
        post_json(
            "/api/interview/end",
            json!({
                "intervieweeId": data["intervieweeId"],
                "responseId": data["responseId"],
                "messages": [
                    { "role": "assistant", "content": "Welcome", "metadata": { "id": "seg-1" } }
                ]
            }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Interview ended");

    let interviews = state.interviews.read().await;
    let record = &interviews[data["responseId"].as_str().unwrap_or_default()];
    assert_eq!(record.messages.len(), 1);
    assert!(record.ended_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_interview_list_serves_outline() -> Result<()> {
    let app = create_router(AppState::default());
    let request = Request::builder()
        .uri("/api/v1/interview/list")
        .body(Body::empty())?;

    let (status, body) = send(app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, default_outline());
    assert!(body["outline"]["sections"].is_array());
    Ok(())
}

#[tokio::test]
async fn test_connection_details_without_credentials() -> Result<()> {
    let app = create_router(AppState::default());

    let (status, body) = send(app, post_json("/api/connection-details", json!({}))).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_connection_details_mints_token() -> Result<()> {
    let app = create_router(AppState::new(Some(livekit()), default_outline()));
    let request = Request::builder()
        .method("POST")
        .uri("/api/connection-details")
        .body(Body::empty())?;

    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
        Some(&b"no-store"[..])
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["serverUrl"], "ws://127.0.0.1:7880");
    assert_eq!(body["participantName"], "user");
    assert!(body["roomName"]
        .as_str()
        .is_some_and(|room| room.starts_with("interview_room_")));
    assert_eq!(
        body["participantToken"]
            .as_str()
            .map(|token| token.split('.').count()),
        Some(3)
    );
    Ok(())
}

#[tokio::test]
async fn test_connection_details_with_room_config() -> Result<()> {
    let app = create_router(AppState::new(Some(livekit()), default_outline()));

    let (status, body) = send(
        app,
        post_json(
            "/api/connection-details",
            json!({
                "room_config": {
                    "agents": [{ "agent_name": "interviewer" }],
                    "metadata": { "prompt_params": { "outline": { "sections": [] } } }
                }
            }),
        ),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body["participantToken"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_connection_details_rejects_bad_json() -> Result<()> {
    let app = create_router(AppState::new(Some(livekit()), default_outline()));
    let request = Request::builder()
        .method("POST")
        .uri("/api/connection-details")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;

    let (status, body) = send(app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .is_some_and(|error| error.starts_with("Invalid request body")));
    Ok(())
}
