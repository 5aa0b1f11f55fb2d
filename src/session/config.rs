use crate::api::TokenRequest;
use crate::transport::CaptureOptions;
use serde::{Deserialize, Serialize};

/// Configuration for a session lifecycle manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Agent to dispatch into the room (None = server default)
    pub agent_name: Option<String>,

    /// Buffer microphone/camera media until the room connection is up
    pub pre_connect_buffer: bool,
}

impl SessionOptions {
    pub fn token_request(&self) -> TokenRequest {
        TokenRequest {
            agent_name: self.agent_name.clone(),
        }
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            pre_connect_buffer: self.pre_connect_buffer,
        }
    }
}
