//! Planning assistant chat
//!
//! The assistant runs as an external workflow reached through a webhook.
//! [`WebhookClient`] speaks the wire protocol and [`ChatSession`] tracks
//! the screen the user is on, the live session and the in-memory
//! conversation history.
//!
//! # Example
//!
//! ```rust,ignore
//! use event_horizon::chat::{ChatSession, WebhookClient};
//! use std::time::Duration;
//!
//! let client = WebhookClient::new("http://localhost:5678/webhook/project-planner", Duration::from_secs(60))?;
//! let mut chat = ChatSession::new(client);
//! chat.new_chat().await?;
//! if let Some(reply) = chat.send("Help me plan a product launch").await? {
//!     println!("{}", reply.content);
//! }
//! ```

mod error;
mod session;
mod webhook;

pub use error::{ChatError, ChatResult};
pub use session::{ChatMessage, ChatPhase, ChatSession, Conversation, Role};
pub use webhook::{ChatBackend, ResumeRequest, WebhookClient, WebhookResponse, DEFAULT_WEBHOOK_URL};
