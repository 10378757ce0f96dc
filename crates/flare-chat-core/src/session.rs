//! Conversation session
//!
//! A [`ChatSession`] owns the turn log of one chat view and lets at most one
//! request to the backend be in flight. The user turn is appended as soon as
//! it is accepted, so the log always reflects submission order. Backend
//! failures never escape the session: they become a fallback assistant turn.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::ai::{ChatBackend, ChatReply, ChatRequest};
use crate::error::{BackendError, SessionError};
use crate::state::Turn;

static NEXT_SESSION_KEY: AtomicU64 = AtomicU64::new(1);

/// Assistant text shown when the backend call fails for any reason.
pub const FALLBACK_REPLY: &str =
    "Sorry, there was an error processing your request. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// An accepted user turn whose reply has not been recorded yet.
///
/// Produced only by [`ChatSession::append_user_turn`] and consumed by
/// [`ChatSession::submit`] or [`ChatSession::resolve`], which ties every
/// accepted user turn to exactly one assistant turn. Only the session that
/// issued it will accept it back.
#[derive(Debug)]
pub struct PendingRequest {
    owner: u64,
    turn: Turn,
    request: ChatRequest,
}

impl PendingRequest {
    /// The user turn that was appended.
    pub fn turn(&self) -> &Turn {
        &self.turn
    }

    /// What goes to the backend: the history before this turn, plus its text.
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }
}

pub struct ChatSession<B: ChatBackend> {
    key: u64,
    backend: B,
    turns: Vec<Turn>,
    state: SessionState,
    session_id: Option<String>,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            key: NEXT_SESSION_KEY.fetch_add(1, Ordering::Relaxed),
            backend,
            turns: Vec::new(),
            state: SessionState::Idle,
            session_id: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    /// Server-side session id, once the backend has handed one out.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Accept a user message and start waiting for its reply.
    pub fn append_user_turn(&mut self, text: &str) -> Result<PendingRequest, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        let request = ChatRequest {
            messages: self.turns.clone(),
            prompt: text.to_string(),
            session_id: self.session_id.clone(),
        };
        let turn = Turn::user(text);

        self.turns.push(turn.clone());
        self.state = SessionState::AwaitingResponse;
        debug!(turns = self.turns.len(), "user turn appended");

        Ok(PendingRequest {
            owner: self.key,
            turn,
            request,
        })
    }

    fn check_owner(&self, pending: &PendingRequest) -> Result<(), SessionError> {
        if pending.owner == self.key {
            Ok(())
        } else {
            Err(SessionError::ForeignRequest)
        }
    }

    /// Send a pending request to the backend and record the outcome.
    ///
    /// Runs until the backend answers or fails; there is no timeout. Backend
    /// failures become the fallback turn; the only error is a request issued
    /// by another session.
    pub async fn submit(&mut self, pending: PendingRequest) -> Result<Turn, SessionError> {
        self.check_owner(&pending)?;
        let outcome = self.backend.chat(&pending.request).await;
        self.resolve(pending, outcome)
    }

    /// Record the outcome of a request that was sent elsewhere (for example on
    /// a spawned task) and return to idle.
    pub fn resolve(
        &mut self,
        pending: PendingRequest,
        outcome: Result<ChatReply, BackendError>,
    ) -> Result<Turn, SessionError> {
        self.check_owner(&pending)?;

        let turn = match outcome {
            Ok(reply) => {
                if reply.session_id.is_some() {
                    self.session_id = reply.session_id;
                }
                Turn::assistant(reply.response)
            }
            Err(e) => {
                warn!(error = %e, prompt = %pending.request.prompt, "chat request failed");
                Turn::assistant(FALLBACK_REPLY)
            }
        };

        self.turns.push(turn.clone());
        self.state = SessionState::Idle;
        Ok(turn)
    }

    /// Clear the conversation here and on the backend.
    ///
    /// A backend failure is logged; the local log is cleared regardless.
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }

        if let Some(session_id) = self.session_id.take() {
            if let Err(e) = self.backend.reset(&session_id).await {
                warn!(error = %e, session_id = %session_id, "backend reset failed");
            }
        }
        self.turns.clear();
        Ok(())
    }
}
