//! In-process transport used for tests and dry runs
//!
//! `LoopbackTransport` keeps the room entirely in memory: it records every
//! call the session layer makes, lets the caller inject failures and remote
//! events, and can hold `connect` open to reproduce start/stop races.

use super::backend::{
    AgentState, CaptureOptions, ConnectionState, RemoteParticipant, RpcRequest, TrackKind,
    TrackPublication, Transport, TransportEvent,
};
use anyhow::{bail, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, Notify};
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// A call made against the transport, in order of arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect { url: String, token: String },
    Disconnect,
    Microphone { enabled: bool, pre_connect_buffer: bool },
    Camera { enabled: bool, pre_connect_buffer: bool },
    Rpc(RpcRequest),
    ProbeMicrophone,
}

#[derive(Debug, Default)]
struct Failures {
    connect: Option<String>,
    microphone: Option<String>,
    camera: Option<String>,
    rpc: Option<String>,
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    participants: Vec<RemoteParticipant>,
    microphone_enabled: bool,
    camera_enabled: bool,
    microphone_permission: bool,
    connect_gate: Option<Arc<Notify>>,
    microphone_gate: Option<Arc<Notify>>,
    failures: Failures,
    calls: Vec<TransportCall>,
}

/// Transport that loops every operation back in memory
pub struct LoopbackTransport {
    inner: Mutex<Inner>,
    events: broadcast::Sender<TransportEvent>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                participants: Vec::new(),
                microphone_enabled: false,
                camera_enabled: false,
                microphone_permission: true,
                connect_gate: None,
                microphone_gate: None,
                failures: Failures::default(),
                calls: Vec::new(),
            }),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-update
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: TransportEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    /// Hold every future `connect` until the returned gate is notified
    pub fn hold_connect(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().connect_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Hold the next microphone toggle until the returned gate is notified
    pub fn hold_microphone(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().microphone_gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn fail_connect(&self, message: impl Into<String>) {
        self.lock().failures.connect = Some(message.into());
    }

    pub fn fail_microphone(&self, message: impl Into<String>) {
        self.lock().failures.microphone = Some(message.into());
    }

    pub fn fail_camera(&self, message: impl Into<String>) {
        self.lock().failures.camera = Some(message.into());
    }

    pub fn fail_rpc(&self, message: impl Into<String>) {
        self.lock().failures.rpc = Some(message.into());
    }

    pub fn deny_microphone(&self) {
        self.lock().microphone_permission = false;
    }

    /// Add a remote participant and announce it
    pub fn join(&self, participant: RemoteParticipant) {
        self.lock().participants.push(participant.clone());
        self.emit(TransportEvent::ParticipantConnected(participant));
    }

    /// Remove a remote participant and announce it
    pub fn leave(&self, identity: &str) {
        self.lock().participants.retain(|p| p.identity != identity);
        self.emit(TransportEvent::ParticipantDisconnected {
            identity: identity.to_string(),
        });
    }

    /// Report a new agent state, as the agent's attributes would
    pub fn set_agent_state(&self, state: AgentState) {
        self.emit(TransportEvent::AgentStateChanged(state));
    }

    /// Inject an arbitrary event
    pub fn push_event(&self, event: TransportEvent) {
        self.emit(event);
    }

    /// Simulate the server closing the connection
    pub fn drop_connection(&self, reason: &str) {
        self.lock().state = ConnectionState::Disconnected;
        self.emit(TransportEvent::Disconnected {
            reason: Some(reason.to_string()),
        });
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    pub fn rpc_calls(&self) -> Vec<RpcRequest> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Rpc(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of microphone toggles with the given target value
    pub fn microphone_calls(&self, enabled: bool) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| {
                matches!(call, TransportCall::Microphone { enabled: e, .. } if *e == enabled)
            })
            .count()
    }

    pub fn microphone_enabled(&self) -> bool {
        self.lock().microphone_enabled
    }

    pub fn camera_enabled(&self) -> bool {
        self.lock().camera_enabled
    }

    fn publication_event(enabled: bool, kind: TrackKind) -> TransportEvent {
        let publication = TrackPublication {
            sid: Some(format!("TR_{:?}", kind).to_uppercase()),
            kind,
        };
        if enabled {
            TransportEvent::LocalTrackPublished(publication)
        } else {
            TransportEvent::LocalTrackUnpublished(publication)
        }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self, url: &str, token: &str) -> Result<()> {
        let gate = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::Connect {
                url: url.to_string(),
                token: token.to_string(),
            });
            inner.state = ConnectionState::Connecting;
            inner.connect_gate.clone()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.lock();
        if inner.state != ConnectionState::Connecting {
            bail!("Connection attempt cancelled by disconnect");
        }
        if let Some(message) = inner.failures.connect.clone() {
            inner.state = ConnectionState::Disconnected;
            bail!(message);
        }
        inner.state = ConnectionState::Connected;
        debug!("Loopback connected to {}", url);
        Ok(())
    }

    async fn disconnect(&self) {
        let was = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::Disconnect);
            let was = inner.state;
            inner.state = ConnectionState::Disconnected;
            inner.microphone_enabled = false;
            inner.camera_enabled = false;
            was
        };

        if was != ConnectionState::Disconnected {
            self.emit(TransportEvent::Disconnected {
                reason: Some("client initiated".to_string()),
            });
        }
    }

    fn state(&self) -> ConnectionState {
        self.lock().state
    }

    fn remote_participants(&self) -> Vec<RemoteParticipant> {
        self.lock().participants.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    async fn set_microphone_enabled(&self, enabled: bool, options: CaptureOptions) -> Result<()> {
        let gate = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::Microphone {
                enabled,
                pre_connect_buffer: options.pre_connect_buffer,
            });
            inner.microphone_gate.take()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let changed = {
            let mut inner = self.lock();
            if let Some(message) = inner.failures.microphone.clone() {
                bail!(message);
            }
            let changed = inner.microphone_enabled != enabled;
            inner.microphone_enabled = enabled;
            changed && inner.state == ConnectionState::Connected
        };

        if changed {
            self.emit(Self::publication_event(enabled, TrackKind::Audio));
        }
        Ok(())
    }

    async fn set_camera_enabled(&self, enabled: bool, options: CaptureOptions) -> Result<()> {
        let changed = {
            let mut inner = self.lock();
            inner.calls.push(TransportCall::Camera {
                enabled,
                pre_connect_buffer: options.pre_connect_buffer,
            });
            if let Some(message) = inner.failures.camera.clone() {
                bail!(message);
            }
            let changed = inner.camera_enabled != enabled;
            inner.camera_enabled = enabled;
            changed && inner.state == ConnectionState::Connected
        };

        if changed {
            self.emit(Self::publication_event(enabled, TrackKind::Video));
        }
        Ok(())
    }

    async fn perform_rpc(&self, request: RpcRequest) -> Result<String> {
        let mut inner = self.lock();
        inner.calls.push(TransportCall::Rpc(request));
        if inner.state != ConnectionState::Connected {
            bail!("Cannot perform RPC while {:?}", inner.state);
        }
        if let Some(message) = inner.failures.rpc.clone() {
            bail!(message);
        }
        Ok(String::new())
    }

    async fn probe_microphone(&self) -> bool {
        let mut inner = self.lock();
        inner.calls.push(TransportCall::ProbeMicrophone);
        inner.microphone_permission
    }
}
