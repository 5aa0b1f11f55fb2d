use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// POST start-interview request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInterviewRequest {
    pub name: String,
    pub email: String,
}

/// Identifiers returned by a successful start-interview call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewData {
    pub interviewee_id: Option<String>,
    pub response_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// POST start-interview response body (success or error shape)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartInterviewResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StartInterviewData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Speaker role in the normalized transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Source transcript entry data carried alongside each message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub identity: Option<String>,
    pub name: Option<String>,
    pub edit_timestamp: Option<DateTime<Utc>>,
}

/// One transcript message in `{role, content, metadata}` form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
    pub metadata: MessageMetadata,
}

/// POST finalize-interview request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeInterviewRequest {
    pub interviewee_id: String,
    pub response_id: String,
    pub messages: Vec<TranscriptMessage>,
}

/// POST finalize-interview response body (success or error shape)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalizeInterviewResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Agent to dispatch into the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDispatch {
    pub agent_name: String,
}

/// Room configuration forwarded to the connection-details endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentDispatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl RoomConfig {
    pub fn is_empty(&self) -> bool {
        self.agents.is_none() && self.metadata.is_none()
    }

    /// First requested agent name, if any
    pub fn agent_name(&self) -> Option<&str> {
        self.agents
            .as_ref()
            .and_then(|agents| agents.first())
            .map(|agent| agent.agent_name.as_str())
    }
}

/// POST connection-details request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDetailsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_config: Option<RoomConfig>,
}

/// Short-lived credentials for joining a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub server_url: String,
    pub room_name: String,
    pub participant_name: String,
    pub participant_token: String,
}

/// GET interview-outline response; only `outline` is consumed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewOutlineResponse {
    #[serde(default)]
    pub outline: Option<Value>,
}

/// Error body returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
