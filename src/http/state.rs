use super::outline::default_outline;
use crate::config::LiveKitConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An interview started through the dev backend
#[derive(Debug, Clone, Serialize)]
pub struct InterviewRecord {
    pub interviewee_id: String,
    pub name: String,
    pub email: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Transcript messages submitted at the end of the interview
    pub messages: Vec<Value>,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Token minting credentials (None = connection details unavailable)
    pub livekit: Option<Arc<LiveKitConfig>>,

    /// Outline document served to clients
    pub outline: Arc<Value>,

    /// Interviews (response_id → record), kept in memory and never evicted
    pub interviews: Arc<RwLock<HashMap<String, InterviewRecord>>>,
}

impl AppState {
    pub fn new(livekit: Option<LiveKitConfig>, outline: Value) -> Self {
        Self {
            livekit: livekit.map(Arc::new),
            outline: Arc::new(outline),
            interviews: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(None, default_outline())
    }
}
