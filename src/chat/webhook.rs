//! Workflow webhook client
//!
//! A session starts with an empty POST to the webhook. The reply carries the
//! session id, a resume URL and the agent's first message; every user message
//! is then POSTed to the most recent resume URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{ChatError, ChatResult};

/// Default workflow webhook
pub const DEFAULT_WEBHOOK_URL: &str = "http://n8n:5678/webhook-test/project-planner";

/// Reply from the start and resume endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhookResponse {
    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(rename = "resumeUrl", default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(alias = "message", default, skip_serializing_if = "Option::is_none")]
    pub direct_message_to_user: Option<String>,
}

/// Body POSTed to a resume URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResumeRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "chatInput")]
    pub chat_input: String,
}

/// Transport for chat sessions
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn start_session(&self) -> ChatResult<WebhookResponse>;

    async fn resume_session(&self, resume_url: &str, request: &ResumeRequest) -> ChatResult<WebhookResponse>;
}

/// HTTP client for the workflow webhook
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    webhook_url: String,
}

impl WebhookClient {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> ChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> ChatResult<WebhookResponse> {
        tracing::debug!(url, "Chat webhook request");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(ChatError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Webhook {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(ChatError::from_transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ChatBackend for WebhookClient {
    async fn start_session(&self) -> ChatResult<WebhookResponse> {
        self.post(&self.webhook_url, &serde_json::json!({})).await
    }

    async fn resume_session(&self, resume_url: &str, request: &ResumeRequest) -> ChatResult<WebhookResponse> {
        self.post(resume_url, request).await
    }
}
