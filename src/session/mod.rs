//! Session lifecycle management
//!
//! This module provides:
//! - `SessionManager`: transport connect/disconnect, active flag, alerts
//! - `SessionOptions`: agent name and pre-connect buffering
//! - `InterviewContext`: the interview identity shared with the finalize sequence
//! - `TranscriptLog`: the live transcript fed by transport events

mod config;
mod context;
mod lifecycle;
mod transcript;

pub use config::SessionOptions;
pub use context::{InterviewContext, InterviewIdentity};
pub use lifecycle::SessionManager;
pub use transcript::{to_message, TranscriptLog};
