pub mod backend;

pub use backend::{BackendClient, ChatReply, ChatRequest, Health};

use async_trait::async_trait;

use crate::error::BackendError;

/// The remote chat service as seen by a conversation session
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, BackendError>;

    /// Drop the server-side history kept for `session_id`.
    async fn reset(&self, session_id: &str) -> Result<(), BackendError>;
}
