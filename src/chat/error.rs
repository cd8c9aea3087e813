//! Chat error types

use thiserror::Error;

/// Errors raised by the chat session and webhook client
#[derive(Error, Debug)]
pub enum ChatError {
    /// Sending requires an active session
    #[error("No active chat session")]
    NoSession,

    /// The webhook has not issued a resume URL for this session yet
    #[error("Chat session {0} has no resume URL yet")]
    NoResumeUrl(String),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("Chat webhook unavailable")]
    Unavailable,

    #[error("Chat webhook timeout")]
    Timeout,

    #[error("Chat webhook error {status}: {message}")]
    Webhook { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid webhook response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ChatError {
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else if err.is_connect() {
            ChatError::Unavailable
        } else {
            ChatError::Request(err)
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
