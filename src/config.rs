use crate::api::{BackendClient, Endpoints, HttpTokenSource};
use crate::error::SessionResult;
use crate::session::SessionOptions;
use crate::view::ViewOptions;
use anyhow::Result;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const ENV_PREFIX: &str = "VOICE_INTERVIEW";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub client: ClientConfig,
    #[serde(default)]
    pub livekit: Option<LiveKitConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// JSON document served by the interview-outline endpoint
    #[serde(default)]
    pub outline_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_agent_join_timeout_secs() -> u64 {
    200
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin the backend endpoints are resolved against
    pub origin: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub sandbox_id: Option<String>,
    #[serde(default)]
    pub pre_connect_buffer: bool,
    #[serde(default = "default_true")]
    pub supports_video_input: bool,
    #[serde(default = "default_agent_join_timeout_secs")]
    pub agent_join_timeout_secs: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl ClientConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            agent_name: self.agent_name.clone(),
            pre_connect_buffer: self.pre_connect_buffer,
        }
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            supports_video_input: self.supports_video_input,
            agent_join_timeout: Duration::from_secs(self.agent_join_timeout_secs),
        }
    }

    pub fn backend(&self) -> SessionResult<BackendClient> {
        BackendClient::new(&self.origin, self.endpoints.clone())
    }

    pub fn token_source(&self) -> SessionResult<HttpTokenSource> {
        Ok(HttpTokenSource::new(self.backend()?, self.sandbox_id.clone()))
    }
}

fn default_token_ttl_seconds() -> u64 {
    3600
}

/// Credentials for minting room access tokens
#[derive(Clone, Deserialize)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl Config {
    /// Load `path` (extension optional)
    ///
    /// Values can be overridden by `VOICE_INTERVIEW`-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
