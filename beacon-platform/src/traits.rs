use crate::error::Result;
use crate::types::{ActionRow, ChannelId, Embed, MessageId, MessageRef};
use async_trait::async_trait;

/// Remote message primitives of a chat platform.
///
/// Every call may fail or block on the network. Implementations never retry.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Unique platform identifier: "discord".
    fn platform_id(&self) -> &str;

    /// Post a new message carrying `embed` and `components`.
    async fn create_message(
        &self,
        channel_id: &ChannelId,
        embed: &Embed,
        components: &[ActionRow],
    ) -> Result<MessageRef>;

    /// Replace the embed of an existing message. Components are left untouched.
    async fn edit_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        embed: &Embed,
    ) -> Result<()>;

    async fn delete_message(&self, channel_id: &ChannelId, message_id: &MessageId) -> Result<()>;
}
