//! Chat session state machine
//!
//! ```text
//!            new_chat / open
//! History ─────────────────────> Interface
//!    ^                               │ webhook reply
//!    │ back                          v
//!    ├──────────────── AwaitingResume{session}   (no resume URL yet)
//!    │                               │ reply with resume URL
//!    │                               v
//!    └──────────────── Active{session, resume_url} <─┐
//!                                    │ send          │
//!                                    └───────────────┘
//! ```
//!
//! Conversations are kept in memory only and listed on the history screen.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::error::{ChatError, ChatResult};
use super::webhook::{ChatBackend, ResumeRequest, WebhookResponse};

/// Maximum characters of the first user message used as a conversation title
const TITLE_LEN: usize = 40;

const DEFAULT_TITLE: &str = "New chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Where the user is in the chat flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPhase {
    History,
    Interface,
    AwaitingResume { session_id: String },
    Active { session_id: String, resume_url: String },
}

/// One conversation in the history list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub last_message: Option<String>,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    messages: Vec<ChatMessage>,
}

impl Conversation {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            last_message: None,
            message_count: 0,
            updated_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    fn push(&mut self, message: ChatMessage) {
        if message.role == Role::User && self.title == DEFAULT_TITLE {
            self.title = title_from(&message.content);
        }
        self.last_message = Some(message.content.clone());
        self.updated_at = message.timestamp;
        self.messages.push(message);
        self.message_count = self.messages.len();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

fn title_from(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= TITLE_LEN {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(TITLE_LEN).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Chat front end over a [`ChatBackend`]
pub struct ChatSession<C: ChatBackend> {
    backend: C,
    phase: ChatPhase,
    conversations: Vec<Conversation>,
    current: Option<String>,
}

impl<C: ChatBackend> ChatSession<C> {
    pub fn new(backend: C) -> Self {
        Self {
            backend,
            phase: ChatPhase::History,
            conversations: Vec::new(),
            current: None,
        }
    }

    pub fn phase(&self) -> &ChatPhase {
        &self.phase
    }

    /// Conversations, most recently updated first
    pub fn history(&self) -> Vec<&Conversation> {
        let mut list: Vec<&Conversation> = self.conversations.iter().collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.current.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Messages of the open conversation
    pub fn messages(&self) -> &[ChatMessage] {
        self.current_conversation()
            .map(Conversation::messages)
            .unwrap_or(&[])
    }

    pub fn session_id(&self) -> Option<&str> {
        match &self.phase {
            ChatPhase::AwaitingResume { session_id } | ChatPhase::Active { session_id, .. } => {
                Some(session_id)
            }
            _ => None,
        }
    }

    fn current_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.current.clone()?;
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn record(&mut self, message: ChatMessage) {
        if let Some(conversation) = self.current_mut() {
            conversation.push(message);
        }
    }

    /// Take session state and agent message from a webhook reply
    fn apply(&mut self, response: WebhookResponse) {
        let session_id = response
            .session_id
            .or_else(|| self.session_id().map(str::to_string));
        let resume_url = response.resume_url.or_else(|| match &self.phase {
            ChatPhase::Active { resume_url, .. } => Some(resume_url.clone()),
            _ => None,
        });

        self.phase = match (session_id, resume_url) {
            (Some(session_id), Some(resume_url)) => ChatPhase::Active {
                session_id,
                resume_url,
            },
            (Some(session_id), None) => ChatPhase::AwaitingResume { session_id },
            _ => ChatPhase::Interface,
        };

        if let Some(text) = response.direct_message_to_user.filter(|t| !t.trim().is_empty()) {
            self.record(ChatMessage::new(Role::Agent, text));
        }
    }

    /// Open a fresh conversation and start a webhook session
    pub async fn new_chat(&mut self) -> ChatResult<&ChatPhase> {
        let conversation = Conversation::new();
        self.current = Some(conversation.id.clone());
        self.conversations.push(conversation);
        self.phase = ChatPhase::Interface;

        let response = self.backend.start_session().await?;
        tracing::info!(session_id = ?response.session_id, "Chat session started");
        self.apply(response);
        Ok(&self.phase)
    }

    /// Show a past conversation; it has no live session
    pub fn open(&mut self, conversation_id: &str) -> ChatResult<()> {
        if !self.conversations.iter().any(|c| c.id == conversation_id) {
            return Err(ChatError::UnknownConversation(conversation_id.to_string()));
        }
        self.current = Some(conversation_id.to_string());
        self.phase = ChatPhase::Interface;
        Ok(())
    }

    /// Return to the history list, dropping the session
    pub fn back(&mut self) {
        self.phase = ChatPhase::History;
        self.current = None;
    }

    /// Send a user message and wait for the agent's reply.
    ///
    /// The user message is recorded before the request, so it stays visible
    /// even when the webhook call fails.
    pub async fn send(&mut self, text: &str) -> ChatResult<Option<&ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let (session_id, resume_url) = match &self.phase {
            ChatPhase::Active {
                session_id,
                resume_url,
            } => (session_id.clone(), resume_url.clone()),
            ChatPhase::AwaitingResume { session_id } => {
                return Err(ChatError::NoResumeUrl(session_id.clone()))
            }
            _ => return Err(ChatError::NoSession),
        };

        self.record(ChatMessage::new(Role::User, text));
        let before = self.messages().len();

        let request = ResumeRequest {
            session_id,
            chat_input: text.to_string(),
        };
        let response = self.backend.resume_session(&resume_url, &request).await?;
        self.apply(response);

        let messages = self.messages();
        Ok(if messages.len() > before {
            messages.last()
        } else {
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted webhook: pops one reply per call and records requests
    #[derive(Default)]
    struct FakeWebhook {
        replies: Mutex<Vec<ChatResult<WebhookResponse>>>,
        requests: Mutex<Vec<(String, ResumeRequest)>>,
    }

    impl FakeWebhook {
        fn with(replies: Vec<ChatResult<WebhookResponse>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::default(),
            }
        }

        fn next(&self) -> ChatResult<WebhookResponse> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ChatError::Unavailable))
        }
    }

    #[async_trait]
    impl ChatBackend for FakeWebhook {
        async fn start_session(&self) -> ChatResult<WebhookResponse> {
            self.next()
        }

        async fn resume_session(&self, resume_url: &str, request: &ResumeRequest) -> ChatResult<WebhookResponse> {
            self.requests
                .lock()
                .unwrap()
                .push((resume_url.to_string(), request.clone()));
            self.next()
        }
    }

    fn reply(session: Option<&str>, resume: Option<&str>, text: &str) -> ChatResult<WebhookResponse> {
        Ok(WebhookResponse {
            session_id: session.map(str::to_string),
            resume_url: resume.map(str::to_string),
            direct_message_to_user: Some(text.to_string()),
        })
    }

    #[tokio::test]
    async fn test_full_flow() {
        let webhook = FakeWebhook::with(vec![
            reply(Some("s-1"), Some("http://n8n/r/1"), "Hello! What are we planning?"),
            reply(None, Some("http://n8n/r/2"), "Great, a launch."),
        ]);
        let mut chat = ChatSession::new(webhook);
        assert_eq!(chat.phase(), &ChatPhase::History);

        chat.new_chat().await.unwrap();
        assert_eq!(
            chat.phase(),
            &ChatPhase::Active {
                session_id: "s-1".into(),
                resume_url: "http://n8n/r/1".into()
            }
        );
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, Role::Agent);

        let answer = chat.send("  Plan a product launch  ").await.unwrap().unwrap();
        assert_eq!(answer.content, "Great, a launch.");

        // Session id kept, resume URL refreshed
        assert_eq!(
            chat.phase(),
            &ChatPhase::Active {
                session_id: "s-1".into(),
                resume_url: "http://n8n/r/2".into()
            }
        );
        let requests = chat.backend.requests.lock().unwrap().clone();
        assert_eq!(requests[0].0, "http://n8n/r/1");
        assert_eq!(requests[0].1.chat_input, "Plan a product launch");

        let conversation = chat.current_conversation().unwrap();
        assert_eq!(conversation.title, "Plan a product launch");
        assert_eq!(conversation.message_count, 3);
        assert_eq!(conversation.last_message.as_deref(), Some("Great, a launch."));

        chat.back();
        assert_eq!(chat.phase(), &ChatPhase::History);
        assert_eq!(chat.session_id(), None);
        assert_eq!(chat.history().len(), 1);
    }

    #[tokio::test]
    async fn test_send_requires_session() {
        let mut chat = ChatSession::new(FakeWebhook::default());
        assert!(matches!(chat.send("hi").await, Err(ChatError::NoSession)));

        let mut chat = ChatSession::new(FakeWebhook::with(vec![reply(Some("s-1"), None, "Hi")]));
        chat.new_chat().await.unwrap();
        assert!(matches!(chat.phase(), ChatPhase::AwaitingResume { .. }));
        assert!(matches!(chat.send("hi").await, Err(ChatError::NoResumeUrl(_))));
        assert!(matches!(chat.send("   ").await, Err(ChatError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_user_message_kept_on_failure() {
        let webhook = FakeWebhook::with(vec![reply(Some("s-1"), Some("http://n8n/r/1"), "Hi")]);
        let mut chat = ChatSession::new(webhook);
        chat.new_chat().await.unwrap();

        assert!(chat.send("are you there?").await.is_err());
        let last = chat.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "are you there?");
        assert!(matches!(chat.phase(), ChatPhase::Active { .. }));
    }

    #[tokio::test]
    async fn test_failed_start_stays_in_interface() {
        let mut chat = ChatSession::new(FakeWebhook::default());
        assert!(chat.new_chat().await.is_err());
        assert_eq!(chat.phase(), &ChatPhase::Interface);
        assert!(chat.messages().is_empty());
    }

    #[tokio::test]
    async fn test_open_past_conversation() {
        let webhook = FakeWebhook::with(vec![reply(Some("s-1"), Some("http://n8n/r/1"), "Hi")]);
        let mut chat = ChatSession::new(webhook);
        chat.new_chat().await.unwrap();
        let id = chat.current_conversation().unwrap().id.clone();
        chat.back();

        chat.open(&id).unwrap();
        assert_eq!(chat.phase(), &ChatPhase::Interface);
        assert_eq!(chat.messages().len(), 1);
        assert!(matches!(chat.open("missing"), Err(ChatError::UnknownConversation(_))));
    }

    #[test]
    fn test_title_truncation() {
        assert_eq!(title_from("short"), "short");
        let long = "x".repeat(60);
        assert_eq!(title_from(&long), format!("{}...", "x".repeat(40)));
    }
}
