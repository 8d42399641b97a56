//! REST action client.
//!
//! Stateless per-call adapter over Discord's request/response API. Every
//! call carries one account's bearer credential in the `Authorization`
//! header and is bounded by a 10s timeout; any transport error, timeout, or
//! non-success status is a delivery error the caller isolates to that call.

use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::StatusCode,
    tracing::debug,
};

use dropfarm_panels::{ActionOutbound, Error, Result};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v9";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Point the client at a non-default API base. Tests use this with a
    /// local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::delivery("failed to build rest client", e))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, token: &str, url: &str, context: &str) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(|e| Error::delivery(context.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::delivery_status(context.to_string(), status.as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| Error::delivery(context.to_string(), e))
    }
}

#[async_trait]
impl ActionOutbound for RestClient {
    async fn post_command(&self, token: &str, channel_id: &str, text: &str) -> Result<()> {
        if token.is_empty() || channel_id.is_empty() {
            return Err(Error::configuration("token and channel id are required"));
        }

        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", token)
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await
            .map_err(|e| Error::delivery(format!("post to channel {channel_id}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::delivery_status(
                format!("post to channel {channel_id}"),
                status.as_u16(),
            ));
        }
        debug!(channel = channel_id, text, "command posted");
        Ok(())
    }

    async fn add_reaction(
        &self,
        token: &str,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<()> {
        if token.is_empty() || channel_id.is_empty() {
            return Err(Error::configuration("token and channel id are required"));
        }

        // Verbatim glyphs are not valid in the path segment.
        let encoded = urlencoding::encode(emoji);
        let url = format!(
            "{}/channels/{channel_id}/messages/{message_id}/reactions/{encoded}/@me",
            self.base_url
        );
        let response = self
            .http
            .put(&url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(|e| Error::delivery(format!("react in channel {channel_id}"), e))?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            return Err(Error::delivery_status(
                format!("react in channel {channel_id}"),
                status.as_u16(),
            ));
        }
        debug!(channel = channel_id, message = message_id, emoji, "reaction added");
        Ok(())
    }

    async fn guild_name(&self, token: &str, channel_id: &str) -> Result<String> {
        let channel_url = format!("{}/channels/{channel_id}", self.base_url);
        let channel = self
            .get_json(token, &channel_url, "resolve channel")
            .await?;

        let Some(guild_id) = channel.get("guild_id").and_then(|v| v.as_str()) else {
            return Ok("Direct message".into());
        };

        let guild_url = format!("{}/guilds/{guild_id}", self.base_url);
        let guild = self.get_json(token, &guild_url, "resolve guild").await?;
        Ok(guild
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("(unnamed server)")
            .to_string())
    }
}
