pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod turn;
pub mod view;

pub use api::{BackendClient, ConnectionDetails, HttpTokenSource, InterviewApi, TokenSource};
pub use config::Config;
pub use error::{Alert, SessionError, SessionResult};
pub use http::{create_router, AppState};
pub use session::{InterviewContext, SessionManager, SessionOptions, TranscriptLog};
pub use transport::{AgentState, ConnectionState, LoopbackTransport, Transport, TransportEvent};
pub use turn::{TurnCoordinator, TurnState};
pub use view::{FinalizeOutcome, Navigator, Route, SessionView, SessionViewParts, ViewOptions};
