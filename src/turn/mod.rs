pub mod agent;
pub mod coordinator;

pub use agent::{is_agent, resolve_agent_identity, AGENT_IDENTITY_PREFIX};
pub use coordinator::{TurnCoordinator, TurnState, END_TURN, START_TURN};
