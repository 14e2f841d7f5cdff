//! OpenAI-compatible completion adapter.
//!
//! Talks to any server exposing `POST {base_url}/v1/chat/completions` (LM Studio,
//! llama.cpp, vLLM, ...). No authentication is sent.

use std::time::Duration;

use async_trait::async_trait;
use sr_core::{
    errors::Error,
    ports::{ChatCompletionRequest, ChatCompletionResponse, CompletionClient},
    utils::truncate_chars,
    Result,
};

/// Upper bound for one completion request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct OpenAiCompatClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(&self, req: &ChatCompletionRequest) -> Result<String> {
        let resp = self
            .http
            .post(self.endpoint())
            .json(req)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Completion(format!("request timed out after {:?}", self.timeout))
                } else {
                    Error::Completion(format!("request error: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: truncate_chars(&body, 200),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Completion(format!("failed to read response: {e}")))?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Completion(format!(
                "unexpected response ({e}): {}",
                truncate_chars(&body, 200)
            ))
        })?;

        let content = parsed.first_content().ok_or_else(|| {
            Error::Completion("response contained no completion content".to_string())
        })?;
        tracing::debug!(model = %req.model, chars = content.len(), "completion received");
        Ok(content.to_string())
    }
}
