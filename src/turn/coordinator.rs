use super::agent::resolve_agent_identity;
use crate::error::{Device, SessionError, SessionResult};
use crate::transport::{
    AgentState, CaptureOptions, RpcRequest, Subscription, TrackKind, TrackPublication, Transport,
    TransportEvent,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub const START_TURN: &str = "start_turn";
pub const END_TURN: &str = "end_turn";

/// Shadow state of the turn coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnState {
    /// Latest state reported by the agent
    pub agent_state: AgentState,

    /// Whether the local microphone is (meant to be) capturing
    pub is_recording: bool,
}

impl TurnState {
    /// The agent only accepts audio while it is listening
    pub fn can_start_recording(&self) -> bool {
        self.agent_state == AgentState::Listening
    }

    pub fn is_agent_speaking(&self) -> bool {
        self.agent_state == AgentState::Speaking
    }
}

#[derive(Debug, Default)]
struct Inner {
    turn: TurnState,
    /// Bumped on every recording start/stop so in-flight starts can tell they were superseded
    epoch: u64,
}

/// Gates local microphone capture on the agent's state and hands turns over by RPC
///
/// The agent's willingness to listen is authoritative: whenever it leaves
/// `listening` while the microphone is open, the coordinator stops capture in
/// the same reaction. `start_turn` / `end_turn` RPCs tell the agent when to
/// begin and stop consuming audio; they are best-effort and independent of
/// the local device toggles.
pub struct TurnCoordinator {
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
    updates: watch::Sender<TurnState>,
}

impl TurnCoordinator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (updates, _) = watch::channel(TurnState::default());
        Self {
            transport,
            inner: Mutex::new(Inner::default()),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change to the turn state and publish it while still holding the lock
    fn update(&self, f: impl FnOnce(&mut Inner)) -> TurnState {
        let mut inner = self.lock();
        f(&mut inner);
        self.updates.send_replace(inner.turn);
        inner.turn
    }

    /// Follow agent state changes from the transport until the guard is dropped
    pub fn attach(self: &Arc<Self>) -> Subscription {
        let mut rx = self.transport.subscribe();
        let weak = Arc::downgrade(self);

        Subscription::new(tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Turn coordinator lagged, {} events skipped", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let Some(coordinator) = weak.upgrade() else {
                    break;
                };

                match event {
                    TransportEvent::AgentStateChanged(state) => {
                        coordinator.on_agent_state(state).await;
                    }
                    TransportEvent::LocalTrackPublished(publication) => {
                        log_audio_track("published", &publication);
                    }
                    TransportEvent::LocalTrackUnpublished(publication) => {
                        log_audio_track("unpublished", &publication);
                    }
                    _ => {}
                }
            }
            debug!("Turn coordinator detached");
        }))
    }

    pub fn snapshot(&self) -> TurnState {
        self.lock().turn
    }

    /// Observe turn state changes
    pub fn watch(&self) -> watch::Receiver<TurnState> {
        self.updates.subscribe()
    }

    pub fn is_recording(&self) -> bool {
        self.snapshot().is_recording
    }

    pub fn can_start_recording(&self) -> bool {
        self.snapshot().can_start_recording()
    }

    /// React to a new agent state
    ///
    /// Leaving `listening` while recording flips `is_recording` off before
    /// the new state is published, then disables the microphone once.
    pub async fn on_agent_state(&self, agent_state: AgentState) {
        let mut forced = false;
        self.update(|inner| {
            inner.turn.agent_state = agent_state;
            if inner.turn.is_recording && agent_state != AgentState::Listening {
                inner.turn.is_recording = false;
                inner.epoch += 1;
                forced = true;
            }
        });

        if !forced {
            return;
        }

        info!("Agent is {:?}; stopping local capture", agent_state);
        if !self.transport.is_connected() {
            debug!("Room is not connected; skipping microphone disable");
            return;
        }
        if let Err(e) = self
            .transport
            .set_microphone_enabled(false, CaptureOptions::default())
            .await
        {
            warn!("Failed to disable microphone: {:#}", e);
        }
    }

    /// Open the microphone and hand the turn to the local participant
    ///
    /// No-op unless the agent is listening, nothing is recording yet, the
    /// microphone permission probe succeeds, and the room is connected.
    pub async fn start_recording(&self) -> SessionResult<()> {
        let turn = self.snapshot();
        if !turn.can_start_recording() || turn.is_recording {
            debug!(
                "Cannot start recording (agent: {:?}, recording: {})",
                turn.agent_state, turn.is_recording
            );
            return Ok(());
        }

        if !self.transport.probe_microphone().await {
            warn!("Microphone permission denied");
            return Ok(());
        }

        if !self.transport.is_connected() {
            warn!("Room is not connected; cannot enable microphone");
            return Ok(());
        }

        // The agent may have moved on during the probe
        let mut epoch = None;
        self.update(|inner| {
            if inner.turn.can_start_recording() && !inner.turn.is_recording {
                inner.turn.is_recording = true;
                inner.epoch += 1;
                epoch = Some(inner.epoch);
            }
        });
        let Some(epoch) = epoch else {
            debug!("Turn state changed before recording started");
            return Ok(());
        };

        if let Err(e) = self
            .transport
            .set_microphone_enabled(true, CaptureOptions::default())
            .await
        {
            self.update(|inner| {
                if inner.epoch == epoch {
                    inner.turn.is_recording = false;
                    inner.epoch += 1;
                }
            });
            error!("Failed to enable microphone: {:#}", e);
            return Err(SessionError::device(Device::Microphone, format!("{:#}", e)));
        }

        let superseded = self.lock().epoch != epoch;
        if superseded {
            info!("Turn ended while the microphone was opening; closing it");
            if let Err(e) = self
                .transport
                .set_microphone_enabled(false, CaptureOptions::default())
                .await
            {
                warn!("Failed to disable microphone: {:#}", e);
            }
            return Ok(());
        }

        match resolve_agent_identity(&self.transport.remote_participants()) {
            Some(identity) => self.signal_turn(identity, START_TURN).await,
            None => warn!("Could not resolve agent identity to send {} RPC", START_TURN),
        }

        Ok(())
    }

    /// Close the microphone and hand the turn back to the agent
    ///
    /// Local state flips to stopped immediately; the `end_turn` RPC is
    /// skipped when the room is not connected and its failure is only logged.
    pub async fn stop_recording(&self) {
        let mut stopped = false;
        self.update(|inner| {
            if inner.turn.is_recording {
                inner.turn.is_recording = false;
                inner.epoch += 1;
                stopped = true;
            }
        });

        if !stopped {
            debug!("Not recording; nothing to stop");
            return;
        }

        info!("Stopping recording");
        if self.transport.is_connected() {
            match resolve_agent_identity(&self.transport.remote_participants()) {
                Some(identity) => self.signal_turn(identity, END_TURN).await,
                None => warn!("Could not resolve agent identity to send {} RPC", END_TURN),
            }
        } else {
            warn!("Room is not connected; skipping {} RPC", END_TURN);
        }

        if let Err(e) = self
            .transport
            .set_microphone_enabled(false, CaptureOptions::default())
            .await
        {
            warn!("Failed to disable microphone: {:#}", e);
        }
    }

    /// Start when idle, stop when recording
    pub async fn toggle_recording(&self) -> SessionResult<()> {
        if self.is_recording() {
            self.stop_recording().await;
            Ok(())
        } else {
            self.start_recording().await
        }
    }

    /// Release the microphone without a turn handshake (session teardown)
    pub async fn release_microphone(&self) -> SessionResult<()> {
        self.update(|inner| {
            if inner.turn.is_recording {
                inner.turn.is_recording = false;
                inner.epoch += 1;
            }
        });

        self.transport
            .set_microphone_enabled(false, CaptureOptions::default())
            .await
            .map_err(|e| SessionError::device(Device::Microphone, format!("{:#}", e)))
    }

    async fn signal_turn(&self, identity: String, method: &str) {
        let request = RpcRequest {
            destination_identity: identity,
            method: method.to_string(),
            payload: String::new(),
        };

        debug!("Sending {} to {}", method, request.destination_identity);
        let result = self
            .transport
            .perform_rpc(request)
            .await
            .map_err(|e| SessionError::Rpc {
                method: method.to_string(),
                message: format!("{:#}", e),
            });
        if let Err(e) = result {
            warn!("{}", e);
        }
    }
}

fn log_audio_track(action: &str, publication: &TrackPublication) {
    if publication.kind == TrackKind::Audio {
        info!(
            "Local audio track {}: {}",
            action,
            publication.sid.as_deref().unwrap_or("[no sid]")
        );
    }
}
