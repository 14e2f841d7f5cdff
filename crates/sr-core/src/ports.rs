use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{Profile, StrongRef, ThreadRef, TimelineEntry},
    Result,
};

/// Hexagonal port for the social feed (session, timeline, posting).
///
/// Every call is a remote call that may fail; the core never retries them.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn login(&self, handle: &str, secret: &str) -> Result<Profile>;

    async fn get_timeline(&self, limit: usize) -> Result<Vec<TimelineEntry>>;

    /// Publish `text` as a reply anchored at `thread`; returns the new post.
    async fn send_post(&self, text: &str, thread: &ThreadRef) -> Result<StrongRef>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Body of a `POST {base_url}/v1/chat/completions` request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the service returned one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

/// Hexagonal port for the text completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the raw content of the first completion.
    async fn complete(&self, req: &ChatCompletionRequest) -> Result<String>;
}
