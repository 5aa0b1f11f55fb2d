use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Backend record identifiers for the running interview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewIdentity {
    pub interviewee_id: String,
    pub response_id: String,
}

/// Session-scoped holder for the interview identity
///
/// Set once after start-interview succeeds and cleared when the finalize
/// sequence completes. Shared by reference between the welcome flow and the
/// session view.
#[derive(Debug, Default)]
pub struct InterviewContext {
    identity: RwLock<Option<InterviewIdentity>>,
}

impl InterviewContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, identity: InterviewIdentity) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = Some(identity);
    }

    pub fn identity(&self) -> Option<InterviewIdentity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear the stored identity, returning the previous value
    pub fn clear(&self) -> Option<InterviewIdentity> {
        self.identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
