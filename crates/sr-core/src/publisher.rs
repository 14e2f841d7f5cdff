use std::sync::Arc;

use crate::{
    domain::{StrongRef, ThreadRef},
    ports::FeedProvider,
    utils::truncate_chars,
    Result,
};

/// Sends a generated reply into its thread through the feed provider.
pub struct ReplyPublisher {
    feed: Arc<dyn FeedProvider>,
}

impl ReplyPublisher {
    pub fn new(feed: Arc<dyn FeedProvider>) -> Self {
        Self { feed }
    }

    /// Publish `text` under `thread`, addressed to `recipient` (used for logs only).
    ///
    /// A failure is logged here and returned for the caller to inspect; it is
    /// never fatal to the cycle.
    pub async fn publish(
        &self,
        recipient: &str,
        thread: &ThreadRef,
        text: &str,
    ) -> Result<StrongRef> {
        match self.feed.send_post(text, thread).await {
            Ok(posted) => {
                tracing::info!(
                    to = recipient,
                    uri = %posted.uri,
                    reply = %truncate_chars(text, 50),
                    "sent reply"
                );
                Ok(posted)
            }
            Err(e) => {
                tracing::error!(
                    to = recipient,
                    reply = %truncate_chars(text, 50),
                    error = %e,
                    "failed to send reply"
                );
                Err(e)
            }
        }
    }
}
