// Shared fakes for the session-layer integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voice_interview::api::{
    ConnectionDetails, FinalizeInterviewRequest, FinalizeInterviewResponse, InterviewApi,
    StartInterviewData, StartInterviewResponse, TokenRequest, TokenSource,
};
use voice_interview::error::{SessionError, SessionResult};
use voice_interview::transport::{LoopbackTransport, RemoteParticipant, Transport};

pub const WAIT: Duration = Duration::from_secs(2);

/// Await `fut`, failing the test if it takes longer than [`WAIT`]
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("timed out waiting")
}

/// Poll `cond` until it holds, failing the test after [`WAIT`]
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    within(async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// A loopback transport already connected with an agent in the room
pub async fn connected_room(agent: &str) -> Arc<LoopbackTransport> {
    let transport = Arc::new(LoopbackTransport::new());
    transport
        .connect("ws://loopback", "token")
        .await
        .expect("loopback connect");
    transport.join(RemoteParticipant::agent(agent));
    transport
}

/// Token source returning fixed credentials, or a configured failure
#[derive(Default)]
pub struct FakeTokenSource {
    failure: Mutex<Option<String>>,
    requests: Mutex<Vec<TokenRequest>>,
}

impl FakeTokenSource {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Mutex::new(Some(message.to_string())),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<TokenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn fetch(&self, request: &TokenRequest) -> SessionResult<ConnectionDetails> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(SessionError::TokenFetch(message));
        }

        Ok(ConnectionDetails {
            server_url: "ws://loopback".to_string(),
            room_name: "interview_room_test".to_string(),
            participant_name: "user".to_string(),
            participant_token: "token".to_string(),
        })
    }
}

/// Interview backend that records finalize requests
#[derive(Default)]
pub struct FakeInterviewApi {
    fail_finalize: bool,
    finalized: Mutex<Vec<FinalizeInterviewRequest>>,
}

impl FakeInterviewApi {
    pub fn failing_finalize() -> Self {
        Self {
            fail_finalize: true,
            ..Default::default()
        }
    }

    pub fn finalized(&self) -> Vec<FinalizeInterviewRequest> {
        self.finalized.lock().unwrap().clone()
    }
}

#[async_trait]
impl InterviewApi for FakeInterviewApi {
    async fn start_interview(
        &self,
        name: &str,
        email: &str,
    ) -> SessionResult<StartInterviewResponse> {
        Ok(StartInterviewResponse {
            success: true,
            data: Some(StartInterviewData {
                interviewee_id: Some("i1".to_string()),
                response_id: Some("r1".to_string()),
                name: Some(name.to_string()),
                email: Some(email.to_string()),
            }),
            ..Default::default()
        })
    }

    async fn finalize_interview(
        &self,
        request: &FinalizeInterviewRequest,
    ) -> SessionResult<FinalizeInterviewResponse> {
        self.finalized.lock().unwrap().push(request.clone());

        if self.fail_finalize {
            return Err(SessionError::Backend {
                status: 500,
                message: "database unavailable".to_string(),
            });
        }

        Ok(FinalizeInterviewResponse {
            success: true,
            message: Some("Interview ended".to_string()),
            error: None,
        })
    }
}
