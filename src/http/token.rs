use crate::api::RoomConfig;
use crate::config::LiveKitConfig;
use livekit_api::access_token::{AccessToken, AccessTokenError, VideoGrants};
use std::time::Duration;

/// Mint a participant token for `room`
///
/// The room configuration, when present, travels as participant metadata so
/// the agent worker can read the dispatch request and prompt parameters.
pub fn mint_participant_token(
    livekit: &LiveKitConfig,
    identity: &str,
    name: &str,
    room: &str,
    room_config: Option<&RoomConfig>,
) -> Result<String, AccessTokenError> {
    let mut token = AccessToken::with_api_key(&livekit.api_key, &livekit.api_secret)
        .with_identity(identity)
        .with_name(name)
        .with_grants(VideoGrants {
            room_join: true,
            room: room.to_string(),
            can_publish: true,
            can_subscribe: true,
            can_publish_data: true,
            ..Default::default()
        })
        .with_ttl(Duration::from_secs(livekit.token_ttl_seconds));

    if let Some(config) = room_config.filter(|config| !config.is_empty()) {
        let metadata = serde_json::to_string(config).unwrap_or_default();
        token = token.with_metadata(&metadata);
    }

    token.to_jwt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AgentDispatch;

    fn livekit() -> LiveKitConfig {
        LiveKitConfig::new("ws://localhost:7880", "devkey", "devsecret-devsecret-devsecret-00")
    }

    #[test]
    fn test_mints_jwt() {
        let token = mint_participant_token(&livekit(), "user-1", "user", "room-1", None).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_mints_with_room_config() {
        let config = RoomConfig {
            agents: Some(vec![AgentDispatch {
                agent_name: "interviewer".to_string(),
            }]),
            metadata: None,
        };
        let token =
            mint_participant_token(&livekit(), "user-1", "user", "room-1", Some(&config)).unwrap();
        assert!(!token.is_empty());
    }
}
