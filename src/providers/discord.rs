use crate::core::notification::NotificationSink;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Posts messages to Discord-compatible webhooks.
#[derive(Default)]
pub struct DiscordWebhook;

impl DiscordWebhook {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    #[instrument(name = "WebhookPost", skip(self, url, content))]
    async fn post(&self, url: &str, content: &str) -> Result<()> {
        debug!("Posting {} characters to webhook", content.len());

        let client = reqwest::Client::builder()
            .user_agent("bullion/1.0")
            .build()?;
        let response = client
            .post(url)
            .json(&WebhookMessage { content })
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for webhook", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(anyhow!(
                "Discord webhook failed ({}): {}",
                status.as_u16(),
                snippet
            ));
        }
        Ok(())
    }
}
