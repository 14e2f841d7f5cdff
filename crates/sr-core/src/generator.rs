//! Reply text generation through the completion port.

use std::sync::Arc;

use crate::{
    config::LlmSettings,
    domain::{GeneratedReply, TimelineEntry},
    ports::{ChatCompletionRequest, ChatMessage, CompletionClient},
    utils::truncate_chars,
};

pub struct ReplyGenerator {
    client: Arc<dyn CompletionClient>,
    settings: LlmSettings,
}

impl ReplyGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    pub fn build_request(&self, entry: &TimelineEntry) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(self.settings.system_prompt.clone()),
                ChatMessage::user(user_prompt(entry)),
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Ask the completion service for a reply to `entry`.
    ///
    /// `None` covers every failure (status, timeout, bad body, transport) as well
    /// as an empty completion. Failures are logged here and never propagated.
    pub async fn generate(&self, entry: &TimelineEntry) -> Option<GeneratedReply> {
        let req = self.build_request(entry);
        match self.client.complete(&req).await {
            Ok(raw) => {
                let text = raw.trim();
                if text.is_empty() {
                    tracing::warn!(author = %entry.author_handle, "completion was empty");
                    return None;
                }
                tracing::info!(
                    author = %entry.author_handle,
                    reply = %truncate_chars(text, 50),
                    "generated reply"
                );
                Some(GeneratedReply {
                    text: text.to_string(),
                })
            }
            Err(e) => {
                tracing::error!(
                    author = %entry.author_handle,
                    post = %truncate_chars(&entry.text, 50),
                    error = %e,
                    "failed to generate reply"
                );
                None
            }
        }
    }
}

fn user_prompt(entry: &TimelineEntry) -> String {
    format!(
        "Reply to this post by @{}: \"{}\"",
        entry.author_handle, entry.text
    )
}
