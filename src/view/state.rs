use crate::transport::{AgentState, ConnectionState, RemoteParticipant};
use crate::turn::{is_agent, TurnState};

/// Render-facing state of the session view, derived from the latest inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub agent_state: AgentState,
    pub is_connected: bool,
    pub is_recording: bool,
    /// Microphone control is offered only while the agent listens
    pub can_record: bool,
    pub is_agent_speaking: bool,
    /// The transcript is shown once the agent is in the room
    pub agent_joined: bool,
}

/// Which controls the control bar shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub leave: bool,
    pub microphone: bool,
    pub camera: bool,
}

pub fn derive_view_state(
    turn: TurnState,
    participants: &[RemoteParticipant],
    connection: ConnectionState,
) -> ViewState {
    ViewState {
        agent_state: turn.agent_state,
        is_connected: connection == ConnectionState::Connected,
        is_recording: turn.is_recording,
        can_record: turn.can_start_recording(),
        is_agent_speaking: turn.is_agent_speaking(),
        agent_joined: participants.iter().any(is_agent),
    }
}

impl ViewState {
    pub fn controls(&self, supports_video_input: bool) -> Controls {
        Controls {
            leave: true,
            microphone: self.can_record,
            camera: supports_video_input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaking_agent_blocks_recording() {
        let turn = TurnState {
            agent_state: AgentState::Speaking,
            is_recording: false,
        };
        let state = derive_view_state(
            turn,
            &[RemoteParticipant::agent("interviewer")],
            ConnectionState::Connected,
        );

        assert!(state.is_agent_speaking);
        assert!(!state.can_record);
        assert!(state.agent_joined);
        assert!(!state.controls(false).microphone);
    }

    #[test]
    fn test_agent_joined_by_identity_prefix() {
        let state = derive_view_state(
            TurnState::default(),
            &[RemoteParticipant::new("agent-7")],
            ConnectionState::Connecting,
        );
        assert!(state.agent_joined);
        assert!(!state.is_connected);
    }

    #[test]
    fn test_listening_agent_allows_recording() {
        let turn = TurnState {
            agent_state: AgentState::Listening,
            is_recording: false,
        };
        let state = derive_view_state(turn, &[], ConnectionState::Connected);

        assert!(state.can_record);
        assert!(!state.agent_joined);
        assert_eq!(
            state.controls(true),
            Controls {
                leave: true,
                microphone: true,
                camera: true
            }
        );
    }
}
