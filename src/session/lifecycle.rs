use super::config::SessionOptions;
use crate::api::TokenSource;
use crate::error::{Alert, Device, SessionError};
use crate::transport::{ConnectionState, Subscription, Transport, TransportEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

const ALERT_CAPACITY: usize = 16;

const CONNECT_ALERT_TITLE: &str = "There was an error connecting to the agent";
const DEVICE_ALERT_TITLE: &str = "Encountered an error with your media devices";

/// Owns one transport connection for the lifetime of a mounted session view
///
/// The manager is created when the view mounts and torn down with
/// [`unmount`](Self::unmount) (or on drop). Teardown marks the manager as
/// aborted, cancels any in-flight connect, and disconnects the transport, so
/// the connection never outlives its owner. Connect failures that resolve
/// after teardown are dropped without an alert.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    token_source: Arc<dyn TokenSource>,
    options: SessionOptions,

    /// User intent to be in a session (distinct from the transport state)
    active: Arc<watch::Sender<bool>>,

    /// Set once the owning view has been torn down
    aborted: Arc<AtomicBool>,

    alerts: broadcast::Sender<Alert>,

    /// In-flight start-session task
    connect_task: Mutex<Option<AbortHandle>>,

    /// Transport observer; dropping it deregisters the handlers
    _events: Subscription,
}

impl SessionManager {
    /// Mount a manager over `transport`; must be called inside a Tokio runtime
    pub fn mount(
        transport: Arc<dyn Transport>,
        token_source: Arc<dyn TokenSource>,
        options: SessionOptions,
    ) -> Self {
        let (active, _) = watch::channel(false);
        let active = Arc::new(active);
        let (alerts, _) = broadcast::channel(ALERT_CAPACITY);

        let events = Self::observe(transport.as_ref(), Arc::clone(&active), alerts.clone());

        Self {
            transport,
            token_source,
            options,
            active,
            aborted: Arc::new(AtomicBool::new(false)),
            alerts,
            connect_task: Mutex::new(None),
            _events: events,
        }
    }

    fn observe(
        transport: &dyn Transport,
        active: Arc<watch::Sender<bool>>,
        alerts: broadcast::Sender<Alert>,
    ) -> Subscription {
        let mut rx = transport.subscribe();

        Subscription::new(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(TransportEvent::Disconnected { reason }) => {
                        let reason = reason.as_deref().unwrap_or("unknown");
                        info!("Transport disconnected ({})", reason);
                        active.send_replace(false);
                    }
                    Ok(TransportEvent::MediaDevicesError(e)) => {
                        error!("Media device error: {}: {}", e.name, e.message);
                        let _ = alerts.send(Alert::new(
                            DEVICE_ALERT_TITLE,
                            format!("{}: {}", e.name, e.message),
                        ));
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session observer lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }

    /// Start the session
    ///
    /// Marks the session active and, when the transport is disconnected,
    /// spawns one combined unit that disables the microphone, enables the
    /// camera, and fetches a token then connects. Any failure in the unit
    /// raises a single alert. Returns the spawned task, or `None` when there
    /// was nothing to start.
    pub fn start_session(&self) -> Option<JoinHandle<()>> {
        if self.aborted.load(Ordering::SeqCst) {
            debug!("Session manager already torn down; ignoring start");
            return None;
        }

        self.active.send_replace(true);

        let state = self.transport.state();
        if state != ConnectionState::Disconnected {
            debug!("Transport is {:?}; not starting a new connection", state);
            return None;
        }

        info!("Starting session");

        let transport = Arc::clone(&self.transport);
        let token_source = Arc::clone(&self.token_source);
        let request = self.options.token_request();
        let capture = self.options.capture_options();
        let aborted = Arc::clone(&self.aborted);
        let alerts = self.alerts.clone();

        let handle = tokio::spawn(async move {
            let result = futures::future::try_join3(
                async {
                    transport
                        .set_microphone_enabled(false, capture)
                        .await
                        .map_err(|e| SessionError::device(Device::Microphone, e))
                },
                async {
                    transport
                        .set_camera_enabled(true, capture)
                        .await
                        .map_err(|e| SessionError::device(Device::Camera, e))
                },
                async {
                    let details = token_source.fetch(&request).await?;
                    transport
                        .connect(&details.server_url, &details.participant_token)
                        .await
                        .map_err(|e| SessionError::Connect(format!("{:#}", e)))
                },
            )
            .await;

            match result {
                Ok(_) => info!("Session connected"),
                Err(err) if aborted.load(Ordering::SeqCst) => {
                    // Expected when a teardown races a connect
                    debug!("Discarding connect error after teardown: {}", err);
                }
                Err(err) => {
                    error!("Failed to start session: {}", err);
                    let _ = alerts.send(Alert::from_error(CONNECT_ALERT_TITLE, &err));
                }
            }
        });

        *self.lock_connect_task() = Some(handle.abort_handle());
        Some(handle)
    }

    /// End the session; safe to call when already disconnected
    pub async fn end_session(&self) {
        info!("Ending session");
        self.active.send_replace(false);
        self.transport.disconnect().await;
    }

    /// Tear down: discard pending results and disconnect unconditionally
    pub async fn unmount(&self) {
        self.abort();
        self.transport.disconnect().await;
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        if let Some(task) = self.lock_connect_task().take() {
            task.abort();
        }
    }

    fn lock_connect_task(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.connect_task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Observe changes to the active flag
    pub fn watch_active(&self) -> watch::Receiver<bool> {
        self.active.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    /// Raise a user-visible alert on this session's channel
    pub fn alert(&self, alert: Alert) {
        let _ = self.alerts.send(alert);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let already_aborted = self.aborted.load(Ordering::SeqCst);
        self.abort();

        if already_aborted || self.transport.state() == ConnectionState::Disconnected {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let transport = Arc::clone(&self.transport);
                runtime.spawn(async move { transport.disconnect().await });
            }
            Err(_) => warn!("Session manager dropped outside a runtime; transport left connected"),
        }
    }
}
