use super::client::BackendClient;
use super::messages::{
    AgentDispatch, ConnectionDetails, ConnectionDetailsRequest, InterviewOutlineResponse,
    RoomConfig,
};
use crate::error::{SessionError, SessionResult};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

const SANDBOX_HEADER: &str = "X-Sandbox-Id";

/// Parameters for a token fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRequest {
    /// Agent to dispatch into the room
    pub agent_name: Option<String>,
}

/// Source of short-lived connection credentials
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self, request: &TokenRequest) -> SessionResult<ConnectionDetails>;
}

/// Token source backed by the interview backend
///
/// Fetches the interview outline first and forwards it as room metadata so
/// the agent can follow it. The outline is optional: if it cannot be fetched
/// the connection proceeds without it. Credential issuance is required and
/// its failure is returned as [`SessionError::TokenFetch`].
#[derive(Debug, Clone)]
pub struct HttpTokenSource {
    backend: BackendClient,
    sandbox_id: Option<String>,
}

impl HttpTokenSource {
    pub fn new(backend: BackendClient, sandbox_id: Option<String>) -> Self {
        Self {
            backend,
            sandbox_id,
        }
    }

    async fn fetch_outline(&self) -> SessionResult<Option<Value>> {
        let url = self.backend.url(&self.backend.endpoints().interview_outline)?;
        let response = self.backend.http().get(url).send().await?;

        if !response.status().is_success() {
            debug!("Interview outline unavailable ({})", response.status());
            return Ok(None);
        }

        let body: InterviewOutlineResponse = response.json().await?;
        Ok(body.outline)
    }

    async fn request_details(
        &self,
        body: &ConnectionDetailsRequest,
    ) -> SessionResult<ConnectionDetails> {
        let url = self.backend.url(&self.backend.endpoints().connection_details)?;

        let response = self
            .backend
            .http()
            .post(url)
            .header(SANDBOX_HEADER, self.sandbox_id.as_deref().unwrap_or_default())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SessionError::Backend {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(response.json().await?)
    }
}

/// Build the room configuration; `None` when there is nothing to configure
pub fn room_config(agent_name: Option<&str>, outline: Option<Value>) -> Option<RoomConfig> {
    let config = RoomConfig {
        agents: agent_name.map(|name| {
            vec![AgentDispatch {
                agent_name: name.to_string(),
            }]
        }),
        metadata: outline.map(|outline| json!({ "prompt_params": { "outline": outline } })),
    };

    (!config.is_empty()).then_some(config)
}

#[async_trait::async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch(&self, request: &TokenRequest) -> SessionResult<ConnectionDetails> {
        let outline = match self.fetch_outline().await {
            Ok(outline) => outline,
            Err(e) => {
                warn!("Failed to fetch interview outline: {}", e);
                None
            }
        };

        let body = ConnectionDetailsRequest {
            room_config: room_config(request.agent_name.as_deref(), outline),
        };

        match self.request_details(&body).await {
            Ok(details) => {
                info!("Received connection details for room {}", details.room_name);
                Ok(details)
            }
            Err(e) => {
                error!("Error fetching connection details: {}", e);
                Err(SessionError::TokenFetch(format!(
                    "Error fetching connection details: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_omitted_when_empty() {
        assert_eq!(room_config(None, None), None);
    }

    #[test]
    fn test_room_config_wraps_outline_in_prompt_params() {
        let config = room_config(Some("interviewer"), Some(json!({ "sections": [] }))).unwrap();

        assert_eq!(config.agent_name(), Some("interviewer"));
        assert_eq!(
            config.metadata,
            Some(json!({ "prompt_params": { "outline": { "sections": [] } } }))
        );
    }

    #[test]
    fn test_request_without_room_config_serializes_empty() {
        let body = ConnectionDetailsRequest {
            room_config: room_config(None, None),
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), "{}");
    }
}
