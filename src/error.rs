use serde::Serialize;

/// Failure of a single status fetch. Always scoped to one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),
    #[error("invalid data shape: {0}")]
    Shape(String),
}

impl FetchError {
    pub fn http_status(status: u16) -> Self {
        FetchError::Transport(format!("HTTP {status}"))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::http_status(status.as_u16()),
            None if err.is_decode() => FetchError::Shape(err.to_string()),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Outcome of a failed status-change command, after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The device answered the follow-up fetch, so it is reachable.
    #[error("command failed: {0}")]
    Rejected(String),
    #[error("device unreachable: {0}")]
    Unreachable(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&CommandError> for ErrorBody {
    fn from(err: &CommandError) -> Self {
        let kind = match err {
            CommandError::Rejected(_) => "rejected",
            CommandError::Unreachable(_) => "unreachable",
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}
