//! Interview backend collaborators
//!
//! Wire types for the four backend endpoints, the reqwest client used by the
//! welcome flow and finalize sequence, and the session token provider.

pub mod client;
pub mod messages;
pub mod token;

pub use client::{BackendClient, Endpoints, InterviewApi};
pub use messages::{
    AgentDispatch, ConnectionDetails, ConnectionDetailsRequest, ErrorResponse,
    FinalizeInterviewRequest, FinalizeInterviewResponse, InterviewOutlineResponse, MessageMetadata,
    Role, RoomConfig, StartInterviewData, StartInterviewRequest, StartInterviewResponse,
    TranscriptMessage,
};
pub use token::{HttpTokenSource, TokenRequest, TokenSource};
