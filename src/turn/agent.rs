//! Agent identity resolution
//!
//! Prefers the transport's explicit agent flag and falls back to the
//! `agent-` identity prefix used by agent workers. The prefix is a naming
//! convention, not a guarantee; keep all uses behind these two functions.

use crate::transport::RemoteParticipant;

pub const AGENT_IDENTITY_PREFIX: &str = "agent-";

/// Whether `participant` looks like the conversational agent
pub fn is_agent(participant: &RemoteParticipant) -> bool {
    participant.is_agent || participant.identity.starts_with(AGENT_IDENTITY_PREFIX)
}

/// Identity of the agent in the roster, if one can be found
pub fn resolve_agent_identity(participants: &[RemoteParticipant]) -> Option<String> {
    participants
        .iter()
        .find(|p| p.is_agent)
        .or_else(|| {
            participants
                .iter()
                .find(|p| p.identity.starts_with(AGENT_IDENTITY_PREFIX))
        })
        .map(|p| p.identity.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_preferred_over_prefix() {
        let roster = vec![
            RemoteParticipant::new("agent-legacy"),
            RemoteParticipant::agent("interviewer"),
        ];
        assert_eq!(resolve_agent_identity(&roster).as_deref(), Some("interviewer"));
    }

    #[test]
    fn test_prefix_fallback() {
        let roster = vec![
            RemoteParticipant::new("observer"),
            RemoteParticipant::new("agent-AJ_x1"),
        ];
        assert_eq!(resolve_agent_identity(&roster).as_deref(), Some("agent-AJ_x1"));
        assert!(is_agent(&roster[1]));
        assert!(!is_agent(&roster[0]));
    }

    #[test]
    fn test_no_agent() {
        assert_eq!(resolve_agent_identity(&[RemoteParticipant::new("user-2")]), None);
        assert_eq!(resolve_agent_identity(&[]), None);
    }
}
