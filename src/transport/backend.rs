use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Connection state of the real-time transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Activity reported by the remote conversational agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    #[default]
    Initializing,
    Connecting,
    Listening,
    Thinking,
    Speaking,
    Disconnected,
}

impl AgentState {
    /// Whether the agent has joined and is taking part in the conversation
    pub fn is_active(self) -> bool {
        matches!(
            self,
            AgentState::Listening | AgentState::Thinking | AgentState::Speaking
        )
    }
}

/// A participant in the room other than the local one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteParticipant {
    /// Unique identity within the room
    pub identity: String,

    /// Display name, if the participant set one
    pub name: Option<String>,

    /// Explicit agent flag, when the transport exposes it
    pub is_agent: bool,
}

impl RemoteParticipant {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            name: None,
            is_agent: false,
        }
    }

    pub fn agent(identity: impl Into<String>) -> Self {
        Self {
            is_agent: true,
            ..Self::new(identity)
        }
    }
}

/// Who authored a transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptAuthor {
    pub identity: String,
    pub name: Option<String>,
    /// True when the local participant spoke this entry
    pub is_local: bool,
}

/// One utterance from the transport's message stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub from: TranscriptAuthor,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Set when a later revision replaced the text
    pub edit_timestamp: Option<DateTime<Utc>>,
}

/// Kind of a local media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A local track publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPublication {
    pub sid: Option<String>,
    pub kind: TrackKind,
}

/// Error reported by the media device layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceError {
    pub name: String,
    pub message: String,
}

/// Events emitted by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connection closed, from any cause
    Disconnected { reason: Option<String> },
    MediaDevicesError(MediaDeviceError),
    LocalTrackPublished(TrackPublication),
    LocalTrackUnpublished(TrackPublication),
    ParticipantConnected(RemoteParticipant),
    ParticipantDisconnected { identity: String },
    AgentStateChanged(AgentState),
    Transcription(TranscriptEntry),
}

/// Options for toggling a local capture device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Buffer captured media locally until the connection is up
    pub pre_connect_buffer: bool,
}

/// A remote procedure call addressed to one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    pub destination_identity: String,
    pub method: String,
    pub payload: String,
}

/// Real-time transport capability set
///
/// The session layer never speaks a media protocol itself. Implementations
/// wrap a concrete SDK (or, for tests and dry runs, the in-process
/// [`LoopbackTransport`](super::LoopbackTransport)).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the room at `url` using `token`
    async fn connect(&self, url: &str, token: &str) -> Result<()>;

    /// Disconnect from the room; a no-op when already disconnected
    async fn disconnect(&self);

    /// Current connection state
    fn state(&self) -> ConnectionState;

    /// Snapshot of the remote participant roster
    fn remote_participants(&self) -> Vec<RemoteParticipant>;

    /// Register an observer for transport events
    ///
    /// Dropping the receiver deregisters it.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Enable or disable local microphone publishing
    async fn set_microphone_enabled(&self, enabled: bool, options: CaptureOptions) -> Result<()>;

    /// Enable or disable local camera publishing
    async fn set_camera_enabled(&self, enabled: bool, options: CaptureOptions) -> Result<()>;

    /// Perform a remote procedure call and return the response payload
    async fn perform_rpc(&self, request: RpcRequest) -> Result<String>;

    /// Check microphone permission by opening and immediately releasing a capture stream
    async fn probe_microphone(&self) -> bool;

    /// Whether the transport reports an open connection
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Event observer task that stops when the guard is dropped
///
/// Holding the guard keeps the subscription alive; dropping it aborts the
/// task, which in turn drops the broadcast receiver.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
