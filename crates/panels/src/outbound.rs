//! Seams implemented by the platform adapter and the drop coordinator.

use async_trait::async_trait;

use crate::{
    Result,
    types::{DropEvent, Panel},
};

/// Outbound Discord actions, issued over the request/response API with a
/// per-account bearer credential. Stateless; independent of the long-lived
/// gateway connection. Every failure is a delivery error isolated to the
/// single call that produced it.
#[async_trait]
pub trait ActionOutbound: Send + Sync {
    /// Post a plain-text message to a channel.
    async fn post_command(&self, token: &str, channel_id: &str, text: &str) -> Result<()>;

    /// Add a reaction to a message. `emoji` is the verbatim glyph; the
    /// implementation percent-encodes it for the wire.
    async fn add_reaction(
        &self,
        token: &str,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<()>;

    /// Resolve the guild name owning a channel, for display.
    async fn guild_name(&self, token: &str, channel_id: &str) -> Result<String>;
}

/// Receiver for qualifying drop announcements. The gateway read loop hands
/// events off through this seam and must not be blocked by the handler;
/// implementations spawn their own work and return immediately.
#[async_trait]
pub trait DropSink: Send + Sync {
    async fn handle_drop(&self, panel: Panel, event: DropEvent);
}
