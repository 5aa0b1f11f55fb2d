use super::messages::{
    FinalizeInterviewRequest, FinalizeInterviewResponse, StartInterviewRequest,
    StartInterviewResponse,
};
use crate::error::{SessionError, SessionResult};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{info, warn};

/// Backend endpoint paths, resolved against the client origin
///
/// Absolute URLs are used as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub start_interview: String,
    pub finalize_interview: String,
    pub interview_outline: String,
    pub connection_details: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            start_interview: "/api/start/interview".to_string(),
            finalize_interview: "/api/interview/end".to_string(),
            interview_outline: "/api/v1/interview/list".to_string(),
            connection_details: "/api/connection-details".to_string(),
        }
    }
}

/// Interview backend operations used by the welcome flow and finalize sequence
#[async_trait::async_trait]
pub trait InterviewApi: Send + Sync {
    /// Register the interviewee and open a response record
    async fn start_interview(&self, name: &str, email: &str)
        -> SessionResult<StartInterviewResponse>;

    /// Attach the transcript to the response record
    async fn finalize_interview(
        &self,
        request: &FinalizeInterviewRequest,
    ) -> SessionResult<FinalizeInterviewResponse>;
}

/// HTTP client for the interview backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    origin: Url,
    endpoints: Endpoints,
}

impl BackendClient {
    pub fn new(origin: &str, endpoints: Endpoints) -> SessionResult<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| SessionError::InvalidInput(format!("Invalid origin {}: {}", origin, e)))?;

        Ok(Self {
            http: Client::new(),
            origin,
            endpoints,
        })
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolve an endpoint path against the origin
    pub fn url(&self, path: &str) -> SessionResult<Url> {
        self.origin
            .join(path)
            .map_err(|e| SessionError::InvalidInput(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[async_trait::async_trait]
impl InterviewApi for BackendClient {
    async fn start_interview(
        &self,
        name: &str,
        email: &str,
    ) -> SessionResult<StartInterviewResponse> {
        let url = self.url(&self.endpoints.start_interview)?;
        let request = StartInterviewRequest {
            name: name.to_string(),
            email: email.to_string(),
        };

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();
        let body: StartInterviewResponse = response.json().await?;

        if !status.is_success() {
            return Err(SessionError::Backend {
                status: status.as_u16(),
                message: body.error.unwrap_or_else(|| "Request failed".to_string()),
            });
        }

        info!("Interview started for {}", email);
        Ok(body)
    }

    async fn finalize_interview(
        &self,
        request: &FinalizeInterviewRequest,
    ) -> SessionResult<FinalizeInterviewResponse> {
        let url = self.url(&self.endpoints.finalize_interview)?;

        let response = self.http.post(url).json(request).send().await?;
        let status = response.status();
        let body: FinalizeInterviewResponse = response.json().await?;

        if !status.is_success() {
            let message = body.error.unwrap_or_else(|| "Request failed".to_string());
            warn!("Finalize interview rejected ({}): {}", status, message);
            return Err(SessionError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_endpoints_resolve_against_origin() {
        let client = BackendClient::new("http://localhost:3000", Endpoints::default()).unwrap();
        let url = client.url(&client.endpoints().connection_details).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/connection-details");
    }

    #[test]
    fn test_absolute_endpoint_overrides_origin() {
        let client = BackendClient::new("http://localhost:3000", Endpoints::default()).unwrap();
        let url = client.url("https://tokens.example.com/details").unwrap();
        assert_eq!(url.as_str(), "https://tokens.example.com/details");
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let err = BackendClient::new("not a url", Endpoints::default()).unwrap_err();
        assert_eq!(err.name(), "ValidationError");
    }
}
