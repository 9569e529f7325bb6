//! Response shaping for the start command.

use crate::catalog::MessageCatalog;
use beacon_platform::{Embed, EmbedField};
use serde::Serialize;

const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
const FLAG_EPHEMERAL: u64 = 1 << 6;
const CONNECT_NOTE: &str = "The capture client can freeze right after connecting.\n\
If it does, restart it and press Register again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectInfo {
    pub host_url: String,
    pub connect_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutInfo {
    pub active_sessions: usize,
    pub max_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartStatus {
    Success(ConnectInfo),
    NoVoiceChannel,
    Lockout(LockoutInfo),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    pub data: InteractionResponseData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponseData {
    pub flags: u64,
    pub content: String,
    pub embeds: Vec<Embed>,
}

impl InteractionResponse {
    pub fn is_private(&self) -> bool {
        self.data.flags & FLAG_EPHEMERAL != 0
    }
}

/// Builds the reply to a start request. Replies are private to the invoker
/// except the lockout warning, which the whole channel should see.
pub fn start_response(status: &StartStatus, catalog: &dyn MessageCatalog) -> InteractionResponse {
    let mut flags = FLAG_EPHEMERAL;
    let mut content = String::new();
    let mut embeds = Vec::new();

    match status {
        StartStatus::Success(info) => {
            embeds.push(connect_embed(info));
        }
        StartStatus::NoVoiceChannel => {
            content = catalog.localize(
                "commands.new.nochannel",
                "Please join a voice channel before starting a match!",
                &[],
            );
        }
        StartStatus::Lockout(info) => {
            content = catalog.localize(
                "commands.new.lockout",
                "If I start any more games, the platform will lock me out or throttle the games I'm running!\n\
Please try again in a few minutes.\n\
Current Games: {{.Games}}",
                &[(
                    "Games",
                    format!("{}/{}", info.active_sessions, info.max_sessions),
                )],
            );
            flags = 0;
        }
    }

    InteractionResponse {
        kind: CHANNEL_MESSAGE_WITH_SOURCE,
        data: InteractionResponseData {
            flags,
            content,
            embeds,
        },
    }
}

fn connect_embed(info: &ConnectInfo) -> Embed {
    let host = info
        .host_url
        .strip_suffix(":443")
        .unwrap_or(&info.host_url);
    Embed::titled("Connect your capture client")
        .with_description("Enter the values below in the capture client's connection settings.")
        .with_field(EmbedField::new("Host", format!("```{host}```")))
        .with_field(EmbedField::new(
            "Code",
            format!("```{}```\n{CONNECT_NOTE}", info.connect_code),
        ))
}
