pub mod ai;
pub mod config;
pub mod error;
pub mod highlight;
pub mod markdown;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{BackendClient, ChatBackend, ChatReply, ChatRequest, Health};
pub use config::Config;
pub use error::{BackendError, SessionError};
pub use highlight::{tokenize, Token, TokenKind, Tokens};
pub use markdown::{code_blocks, segments, CodeBlock, Segment};
pub use session::{ChatSession, PendingRequest, SessionState, FALLBACK_REPLY};
pub use state::{Role, Turn};
