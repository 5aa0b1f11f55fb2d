//! Development backend
//!
//! Serves the four endpoints the client consumes so a session can be run
//! end-to-end against a local LiveKit server:
//! - POST /api/start/interview - Register an interviewee
//! - POST /api/interview/end - Submit the transcript
//! - GET /api/v1/interview/list - Research outline
//! - POST /api/connection-details - Mint room credentials
//! - GET /health - Health check

mod handlers;
mod outline;
mod routes;
mod state;
mod token;

pub use outline::{default_outline, load_outline};
pub use routes::create_router;
pub use state::{AppState, InterviewRecord};
pub use token::mint_participant_token;
