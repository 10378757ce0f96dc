use thiserror::Error;

/// Call rejected by the conversation session. Nothing was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a chat request is already in flight")]
    Busy,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("pending request belongs to a different session")]
    ForeignRequest,
}

/// Failure of an outbound call to the chat backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("chat backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("chat backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode chat backend response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    pub fn other(message: impl Into<String>) -> Self {
        BackendError::Other(message.into())
    }
}
