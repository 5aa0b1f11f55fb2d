use super::state::{AppState, InterviewRecord};
use super::token::mint_participant_token;
use crate::api::{
    ConnectionDetails, ConnectionDetailsRequest, ErrorResponse, FinalizeInterviewResponse,
    StartInterviewData, StartInterviewResponse,
};
use crate::view::validate_email;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartInterviewBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewBody {
    #[serde(default)]
    pub interviewee_id: Option<String>,
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub messages: Option<Value>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(StartInterviewResponse {
            success: false,
            error: Some(message.to_string()),
            ..Default::default()
        }),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/start/interview
/// Register an interviewee and open a response
pub async fn start_interview(
    State(state): State<AppState>,
    Json(body): Json<StartInterviewBody>,
) -> Response {
    let (Some(name), Some(email)) = (non_empty(body.name), non_empty(body.email)) else {
        return bad_request("Name and email are required");
    };

    if let Err(e) = validate_email(&email) {
        return bad_request(&e.to_string());
    }

    let interviewee_id = Uuid::new_v4().to_string();
    let response_id = Uuid::new_v4().to_string();

    info!(
        "Starting interview {} for interviewee {}",
        response_id, interviewee_id
    );

    {
        let mut interviews = state.interviews.write().await;
        interviews.insert(
            response_id.clone(),
            InterviewRecord {
                interviewee_id: interviewee_id.clone(),
                name: name.clone(),
                email: email.clone(),
                started_at: chrono::Utc::now(),
                ended_at: None,
                messages: Vec::new(),
            },
        );
    }

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            success: true,
            data: Some(StartInterviewData {
                interviewee_id: Some(interviewee_id),
                response_id: Some(response_id),
                name: Some(name),
                email: Some(email),
            }),
            message: Some("Interview started".to_string()),
            error: None,
        }),
    )
        .into_response()
}

/// POST /api/interview/end
/// Store the transcript of a finished interview
pub async fn end_interview(
    State(state): State<AppState>,
    Json(body): Json<EndInterviewBody>,
) -> Response {
    let (Some(interviewee_id), Some(response_id)) = (
        non_empty(body.interviewee_id),
        non_empty(body.response_id),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "intervieweeId and responseId are required",
        );
    };

    let Some(Value::Array(messages)) = body.messages else {
        return error_response(StatusCode::BAD_REQUEST, "messages must be an array");
    };

    let count = messages.len();
    {
        let mut interviews = state.interviews.write().await;
        match interviews.get_mut(&response_id) {
            Some(record) if record.interviewee_id == interviewee_id => {
                record.ended_at = Some(chrono::Utc::now());
                record.messages = messages;
            }
            Some(_) => {
                warn!(
                    "Interview {} does not belong to interviewee {}",
                    response_id, interviewee_id
                );
            }
            None => {
                warn!("Ending unknown interview {}", response_id);
            }
        }
    }

    info!("Interview {} ended ({} messages)", response_id, count);

    (
        StatusCode::OK,
        Json(FinalizeInterviewResponse {
            success: true,
            message: Some("Interview ended".to_string()),
            error: None,
        }),
    )
        .into_response()
}

/// GET /api/v1/interview/list
/// Serve the research outline document
pub async fn interview_list(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.outline.as_ref().clone()))
}

/// POST /api/connection-details
/// Mint credentials for a fresh room
pub async fn connection_details(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ConnectionDetailsRequest::default()
    } else {
        match serde_json::from_slice::<ConnectionDetailsRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid connection-details body: {}", e);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request body: {}", e),
                );
            }
        }
    };

    let Some(livekit) = state.livekit.as_ref() else {
        error!("Connection details requested but no LiveKit credentials are configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "LiveKit credentials are not configured",
        );
    };

    let identity = format!("interview_user_{}", short_id());
    let room_name = format!("interview_room_{}", short_id());
    let participant_name = "user".to_string();

    let token = match mint_participant_token(
        livekit,
        &identity,
        &participant_name,
        &room_name,
        request.room_config.as_ref(),
    ) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to mint participant token: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to mint participant token: {}", e),
            );
        }
    };

    info!(
        "Issued connection details for room {} (agent: {:?})",
        room_name,
        request.room_config.as_ref().and_then(|c| c.agent_name())
    );

    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Json(ConnectionDetails {
            server_url: livekit.url.clone(),
            room_name,
            participant_name,
            participant_token: token,
        }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
