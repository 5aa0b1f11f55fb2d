use super::navigation::Route;
use crate::api::InterviewApi;
use crate::error::{SessionError, SessionResult};
use crate::session::{InterviewContext, InterviewIdentity};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{error, info, warn};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("Please enter an email address")]
    Missing,
    #[error("Please enter a valid email address")]
    Invalid,
    #[error("Email address cannot contain consecutive dots")]
    ConsecutiveDots,
    #[error("Invalid email format")]
    BadStart,
    #[error("Invalid email domain")]
    BadDomain,
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

/// Validate an email address the way the start-interview form does
pub fn validate_email(email: &str) -> Result<(), EmailError> {
    if email.trim().is_empty() {
        return Err(EmailError::Missing);
    }
    if !email_regex().is_some_and(|re| re.is_match(email)) {
        return Err(EmailError::Invalid);
    }
    if email.contains("..") {
        return Err(EmailError::ConsecutiveDots);
    }
    if email.starts_with('.') || email.starts_with('@') {
        return Err(EmailError::BadStart);
    }

    let domain = email.split_once('@').map(|(_, domain)| domain).unwrap_or_default();
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(EmailError::BadDomain);
    }

    Ok(())
}

/// Start an interview and return the talk-room route to open
///
/// Stores the returned identity in `context` when the backend provides both
/// ids; the session can still proceed without them (the transcript is then
/// not uploaded at the end).
pub async fn begin_interview(
    api: &dyn InterviewApi,
    context: &InterviewContext,
    name: &str,
    email: &str,
) -> SessionResult<Route> {
    let name = name.trim();
    let email = email.trim();

    if name.is_empty() {
        return Err(SessionError::InvalidInput("Name is required".to_string()));
    }
    validate_email(email).map_err(|e| SessionError::InvalidInput(e.to_string()))?;

    let response = api.start_interview(name, email).await.map_err(|e| {
        error!("Failed to start interview: {}", e);
        e
    })?;

    match response.data {
        Some(data) => match (data.interviewee_id, data.response_id) {
            (Some(interviewee_id), Some(response_id)) => {
                info!("Interview {} started for interviewee {}", response_id, interviewee_id);
                context.set(InterviewIdentity {
                    interviewee_id,
                    response_id,
                });
            }
            _ => warn!("Start-interview response is missing identifiers"),
        },
        None => warn!("Start-interview response carried no data"),
    }

    Ok(Route::TalkRoom {
        name: name.to_string(),
        email: email.to_string(),
    })
}
