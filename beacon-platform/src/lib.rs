//! Chat platform seam for Beacon.
//!
//! Adapters are pure I/O: they turn Beacon embeds and components into platform
//! create/edit/delete calls and report the resulting message location.

mod discord;
mod error;
mod traits;
mod types;

pub use discord::DiscordPlatform;
pub use error::{PlatformError, Result};
pub use traits::ChatPlatform;
pub use types::{
    ActionRow, Button, ButtonStyle, ChannelId, Embed, EmbedField, GuildId, MessageId, MessageRef,
    UserId,
};
