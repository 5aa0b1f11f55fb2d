use super::navigation::{Navigator, Route};
use super::state::{derive_view_state, ViewState};
use crate::api::{FinalizeInterviewRequest, InterviewApi};
use crate::error::Alert;
use crate::session::{to_message, InterviewContext, SessionManager, TranscriptLog};
use crate::transport::{AgentState, CaptureOptions, Subscription, TransportEvent};
use crate::turn::{is_agent, resolve_agent_identity, TurnCoordinator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default time the agent has to join before the session is abandoned
pub const DEFAULT_AGENT_JOIN_TIMEOUT: Duration = Duration::from_secs(200);

/// View-level options
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub supports_video_input: bool,
    pub agent_join_timeout: Duration,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            supports_video_input: true,
            agent_join_timeout: DEFAULT_AGENT_JOIN_TIMEOUT,
        }
    }
}

/// Outcome of the transcript upload step of the finalize sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Transcript submitted to the backend
    Persisted { messages: usize },
    /// No interview identity was stored
    Skipped,
    /// Upload failed; the sequence carried on
    Failed(String),
    /// Another finalize already ran
    AlreadyFinalized,
}

/// Collaborators a session view is composed from
pub struct SessionViewParts {
    pub session: Arc<SessionManager>,
    pub turns: Arc<TurnCoordinator>,
    pub transcript: Arc<TranscriptLog>,
    pub context: Arc<InterviewContext>,
    pub api: Arc<dyn InterviewApi>,
    pub navigator: Arc<dyn Navigator>,
}

/// Session view controller
///
/// Composes the lifecycle manager and turn coordinator, derives the
/// render-facing state, and owns the finalize sequence. The sequence runs at
/// most once per view, whether the user leaves or the agent ends the
/// conversation, and always ends with exactly one navigation to the
/// thank-you view.
pub struct SessionView {
    session: Arc<SessionManager>,
    turns: Arc<TurnCoordinator>,
    transcript: Arc<TranscriptLog>,
    context: Arc<InterviewContext>,
    api: Arc<dyn InterviewApi>,
    navigator: Arc<dyn Navigator>,
    options: ViewOptions,
    finalized: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SessionView {
    pub fn new(parts: SessionViewParts, options: ViewOptions) -> Self {
        Self {
            session: parts.session,
            turns: parts.turns,
            transcript: parts.transcript,
            context: parts.context,
            api: parts.api,
            navigator: parts.navigator,
            options,
            finalized: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Wire the view to the transport and start the session
    ///
    /// Attaches the turn coordinator and transcript recorder, watches for the
    /// agent ending the conversation, arms the agent-join timeout, and calls
    /// `start_session`, returning its connect task. Must be called inside a
    /// Tokio runtime.
    pub fn mount(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let transport = self.session.transport();
        let subscriptions = vec![
            self.turns.attach(),
            self.transcript.record(transport.as_ref()),
            self.watch_agent_exit(),
            self.arm_join_timeout(),
        ];
        self.lock_subscriptions().extend(subscriptions);

        self.session.start_session()
    }

    /// Detach the view and release the session
    ///
    /// Stops every observer and the join timeout, then unmounts the
    /// lifecycle manager so late connect results are ignored.
    pub async fn unmount(&self) {
        self.detach();
        self.session.unmount().await;
    }

    fn detach(&self) {
        let subscriptions = std::mem::take(&mut *self.lock_subscriptions());
        if !subscriptions.is_empty() {
            debug!("Detaching {} view observers", subscriptions.len());
        }
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Finalize once the agent leaves after having joined
    fn watch_agent_exit(self: &Arc<Self>) -> Subscription {
        let transport = Arc::clone(self.session.transport());
        let mut rx = transport.subscribe();
        let view = Arc::downgrade(self);

        Subscription::new(tokio::spawn(async move {
            let mut agent_was_active = false;
            let mut agent_identity: Option<String> = None;
            loop {
                let agent_left = match rx.recv().await {
                    Ok(TransportEvent::AgentStateChanged(state)) => {
                        if state.is_active() {
                            agent_was_active = true;
                            if agent_identity.is_none() {
                                agent_identity =
                                    resolve_agent_identity(&transport.remote_participants());
                            }
                        }
                        agent_was_active && state == AgentState::Disconnected
                    }
                    Ok(TransportEvent::ParticipantDisconnected { identity }) => {
                        agent_identity.as_deref() == Some(identity.as_str())
                    }
                    Ok(_) => false,
                    Err(RecvError::Lagged(_)) => false,
                    Err(RecvError::Closed) => break,
                };

                if agent_left {
                    info!("Agent ended the conversation");
                    finalize_detached(&view);
                    break;
                }
            }
        }))
    }

    /// End the session if the agent never becomes active
    fn arm_join_timeout(self: &Arc<Self>) -> Subscription {
        let mut turns = self.turns.watch();
        let timeout = self.options.agent_join_timeout;
        let view = Arc::downgrade(self);

        Subscription::new(tokio::spawn(async move {
            let joined = matches!(
                tokio::time::timeout(timeout, turns.wait_for(|turn| turn.agent_state.is_active()))
                    .await,
                Ok(Ok(_))
            );

            if joined {
                debug!("Agent joined within {:?}", timeout);
                return;
            }

            let Some(view) = view.upgrade() else {
                return;
            };
            if view.finalized.load(Ordering::SeqCst) {
                return;
            }
            warn!("Agent did not join within {:?}", timeout);
            view.session.alert(Alert::new(
                "Session ended",
                "The agent did not join the room. Please try again.",
            ));
            view.session.end_session().await;
        }))
    }

    /// Current render-facing state
    pub fn state(&self) -> ViewState {
        let transport = self.session.transport();
        derive_view_state(
            self.turns.snapshot(),
            &transport.remote_participants(),
            transport.state(),
        )
    }

    pub fn agent_joined(&self) -> bool {
        self.session
            .transport()
            .remote_participants()
            .iter()
            .any(is_agent)
    }

    pub fn supports_video_input(&self) -> bool {
        self.options.supports_video_input
    }

    pub fn turns(&self) -> &Arc<TurnCoordinator> {
        &self.turns
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn transcript(&self) -> &Arc<TranscriptLog> {
        &self.transcript
    }

    /// User pressed leave
    pub async fn disconnect(&self) -> FinalizeOutcome {
        self.finalize().await
    }

    /// Release devices, upload the transcript, clear the identity, and navigate away
    ///
    /// Every step tolerates failure of the previous ones; navigation to the
    /// thank-you view always happens.
    pub async fn finalize(&self) -> FinalizeOutcome {
        if self.finalized.swap(true, Ordering::SeqCst) {
            debug!("Finalize already ran for this view");
            return FinalizeOutcome::AlreadyFinalized;
        }

        info!("Finalizing interview session");
        self.detach();

        self.release_devices().await;
        let outcome = self.persist_transcript().await;

        self.context.clear();
        self.session.end_session().await;
        self.navigator.navigate(Route::ThankYou);

        outcome
    }

    async fn release_devices(&self) {
        if let Err(e) = self.turns.release_microphone().await {
            warn!("Failed to disable microphone: {}", e);
        }

        if let Err(e) = self
            .session
            .transport()
            .set_camera_enabled(false, CaptureOptions::default())
            .await
        {
            warn!("Failed to disable camera: {:#}", e);
        }
    }

    async fn persist_transcript(&self) -> FinalizeOutcome {
        let Some(identity) = self.context.identity() else {
            warn!("No interview identity stored; skipping transcript upload");
            return FinalizeOutcome::Skipped;
        };

        let messages = self
            .transcript
            .with_entries(|entries| entries.iter().map(to_message).collect::<Vec<_>>());
        let count = messages.len();

        let request = FinalizeInterviewRequest {
            interviewee_id: identity.interviewee_id,
            response_id: identity.response_id,
            messages,
        };

        match self.api.finalize_interview(&request).await {
            Ok(_) => {
                info!("Interview transcript saved ({} messages)", count);
                FinalizeOutcome::Persisted { messages: count }
            }
            Err(e) => {
                error!("Failed to finalize interview: {}", e);
                FinalizeOutcome::Failed(e.to_string())
            }
        }
    }
}

fn finalize_detached(view: &Weak<SessionView>) {
    if let Some(view) = view.upgrade() {
        tokio::spawn(async move {
            view.finalize().await;
        });
    }
}
