use std::fmt;
use thiserror::Error;

/// Local capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Microphone,
    Camera,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Microphone => write!(f, "microphone"),
            Device::Camera => write!(f, "camera"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    TokenFetch(String),

    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Failed to toggle {device}: {message}")]
    Device { device: Device, message: String },

    #[error("RPC {method} failed: {message}")]
    Rpc { method: String, message: String },

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidInput(String),
}

impl SessionError {
    /// Short error name shown in alerts as `"{name}: {message}"`
    pub fn name(&self) -> &'static str {
        match self {
            SessionError::TokenFetch(_) => "TokenFetchError",
            SessionError::Connect(_) => "ConnectionError",
            SessionError::Device { .. } => "DeviceError",
            SessionError::Rpc { .. } => "RpcError",
            SessionError::Backend { .. } => "BackendError",
            SessionError::Http(_) => "NetworkError",
            SessionError::InvalidInput(_) => "ValidationError",
        }
    }

    pub fn device(device: Device, err: impl fmt::Display) -> Self {
        SessionError::Device {
            device,
            message: err.to_string(),
        }
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// User-visible notification, rendered by the UI as a toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub description: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Alert describing `err` as `"{name}: {message}"`
    pub fn from_error(title: impl Into<String>, err: &SessionError) -> Self {
        Self::new(title, format!("{}: {}", err.name(), err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_names_failing_step() {
        let err = SessionError::TokenFetch("Error fetching connection details!".to_string());
        let alert = Alert::from_error("There was an error connecting to the agent", &err);

        assert_eq!(
            alert.description,
            "TokenFetchError: Error fetching connection details!"
        );
    }

    #[test]
    fn test_device_error_display() {
        let err = SessionError::device(Device::Camera, "NotAllowedError");
        assert_eq!(err.to_string(), "Failed to toggle camera: NotAllowedError");
        assert_eq!(err.name(), "DeviceError");
    }

    #[test]
    fn test_rpc_error_names_method() {
        let err = SessionError::Rpc {
            method: "start_turn".to_string(),
            message: "agent unreachable".to_string(),
        };
        assert_eq!(err.to_string(), "RPC start_turn failed: agent unreachable");
        assert_eq!(err.name(), "RpcError");
    }
}
