use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::ChatBackend;
use crate::error::BackendError;
use crate::state::Turn;

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Turn>,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Successful `POST /api/chat` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `GET /` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rag: Option<String>,
}

impl Health {
    pub fn rag_available(&self) -> bool {
        self.rag.as_deref() == Some("available")
    }
}

#[derive(Serialize)]
struct ResetRequest<'a> {
    session_id: &'a str,
}

/// Turn a non-2xx response into [`BackendError::Status`] carrying the body.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status { status, body })
}

/// HTTP client for the chat backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_http_client(Client::new(), base_url)
    }

    /// Use a preconfigured `reqwest` client (proxies, timeouts, TLS).
    pub fn with_http_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Health, BackendError> {
        let url = format!("{}/", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        check_status(response).await?.json().await.map_err(BackendError::Decode)
    }

    /// Single health probe; any failure counts as "RAG unavailable".
    pub async fn rag_available(&self) -> bool {
        match self.health().await {
            Ok(health) => health.rag_available(),
            Err(e) => {
                warn!(error = %e, "health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl ChatBackend for BackendClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(
            url = %url,
            history = request.messages.len(),
            session_id = ?request.session_id,
            "sending chat request"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        check_status(response).await?.json().await.map_err(BackendError::Decode)
    }

    async fn reset(&self, session_id: &str) -> Result<(), BackendError> {
        let url = format!("{}/api/reset", self.base_url);
        debug!(url = %url, session_id, "resetting backend session");

        let response = self
            .client
            .post(&url)
            .json(&ResetRequest { session_id })
            .send()
            .await
            .map_err(BackendError::Transport)?;

        check_status(response).await?;
        Ok(())
    }
}
