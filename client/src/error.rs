use std::time::Duration;

use shared::ValidationError;
use thiserror::Error;

/// Everything that can go wrong between the core and its collaborators.
///
/// Cloneable so the same failure can be published to state observers and returned to the
/// caller that triggered it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("remote service answered {status}: {message}")]
    RemoteRejection { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no route found between the selected points")]
    NoRoute,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("superseded by newer input")]
    Superseded,
}

impl CoreError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, CoreError::Superseded)
    }

    /// Transport-level failures: the collaborator could not be reached in time.
    pub fn is_transport(&self) -> bool {
        matches!(self, CoreError::NetworkFailure(_) | CoreError::Timeout(_))
    }

    /// Short inline text for the UI.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::NetworkFailure(_) | CoreError::Timeout(_) => {
                "Service unreachable, check your connection and retry".to_string()
            }
            CoreError::RemoteRejection { status, .. } => format!("Request failed (HTTP {status})"),
            CoreError::MalformedResponse(_) => "Unexpected answer from the service".to_string(),
            CoreError::NoRoute => "No road route between these points".to_string(),
            CoreError::Validation(err) => err.to_string(),
            CoreError::Superseded => String::new(),
        }
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            CoreError::RemoteRejection {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            CoreError::MalformedResponse(err.to_string())
        } else {
            CoreError::NetworkFailure(err.to_string())
        }
    }
}
