use crate::api::{MessageMetadata, Role, TranscriptMessage};
use crate::transport::{Subscription, TranscriptEntry, Transport, TransportEvent};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Live transcript of the session, in arrival order
///
/// Transcription events for an id already in the log are revisions: they
/// replace the text in place and set `edit_timestamp`.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    entries: RwLock<Vec<TranscriptEntry>>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry or apply a revision to an existing one
    pub fn upsert(&self, entry: TranscriptEntry) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => {
                if existing.text != entry.text {
                    existing.edit_timestamp = entry.edit_timestamp.or(Some(entry.timestamp));
                    existing.text = entry.text;
                }
            }
            None => entries.push(entry),
        }
    }

    /// Borrow the entries without copying them
    pub fn with_entries<R>(&self, f: impl FnOnce(&[TranscriptEntry]) -> R) -> R {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }

    pub fn len(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the newest entry was spoken locally
    pub fn last_is_local(&self) -> bool {
        self.with_entries(|entries| entries.last().is_some_and(|e| e.from.is_local))
    }

    /// Feed transcription events from `transport` into the log until the guard is dropped
    pub fn record(self: &Arc<Self>, transport: &dyn Transport) -> Subscription {
        let mut rx = transport.subscribe();
        let log = Arc::downgrade(self);

        Subscription::new(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(TransportEvent::Transcription(entry)) => match log.upgrade() {
                        Some(log) => log.upsert(entry),
                        None => break,
                    },
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Transcript recorder lagged, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Transcript recorder stopped");
        }))
    }
}

/// Normalize an entry into the `{role, content, metadata}` shape
///
/// Entries spoken by the local participant are `user`, everything else is
/// `assistant`.
pub fn to_message(entry: &TranscriptEntry) -> TranscriptMessage {
    TranscriptMessage {
        role: if entry.from.is_local {
            Role::User
        } else {
            Role::Assistant
        },
        content: entry.text.clone(),
        metadata: MessageMetadata {
            id: entry.id.clone(),
            timestamp: entry.timestamp,
            identity: Some(entry.from.identity.clone()),
            name: entry.from.name.clone(),
            edit_timestamp: entry.edit_timestamp,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TranscriptAuthor;
    use chrono::{Duration, Utc};

    fn entry(id: &str, text: &str, is_local: bool) -> TranscriptEntry {
        TranscriptEntry {
            id: id.to_string(),
            from: TranscriptAuthor {
                identity: if is_local { "user-1" } else { "agent-1" }.to_string(),
                name: None,
                is_local,
            },
            text: text.to_string(),
            timestamp: Utc::now(),
            edit_timestamp: None,
        }
    }

    #[test]
    fn test_revision_replaces_text_in_place() {
        let log = TranscriptLog::new();
        log.upsert(entry("a", "Hel", false));
        log.upsert(entry("b", "hi", true));

        let mut revised = entry("a", "Hello there", false);
        revised.timestamp += Duration::seconds(2);
        log.upsert(revised.clone());

        log.with_entries(|entries| {
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].text, "Hello there");
            assert_eq!(entries[0].edit_timestamp, Some(revised.timestamp));
            assert_eq!(entries[1].id, "b");
        });
        assert!(log.last_is_local());
    }

    #[test]
    fn test_identical_revision_is_not_an_edit() {
        let log = TranscriptLog::new();
        log.upsert(entry("a", "same", false));
        log.upsert(entry("a", "same", false));

        log.with_entries(|entries| assert_eq!(entries[0].edit_timestamp, None));
    }

    #[test]
    fn test_role_follows_local_flag() {
        assert_eq!(to_message(&entry("a", "hi", true)).role, Role::User);
        assert_eq!(to_message(&entry("b", "hello", false)).role, Role::Assistant);
    }
}
