use crate::error::{PlatformError, Result};
use crate::traits::ChatPlatform;
use crate::types::{ActionRow, ChannelId, Embed, MessageId, MessageRef};
use serde::Deserialize;
use std::time::Duration;

const DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";
const DISCORD_ACTION_ROW_TYPE: u8 = 1;
const DISCORD_BUTTON_TYPE: u8 = 2;
const DISCORD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct DiscordPlatform {
    http: reqwest::Client,
    bot_token: String,
    api_base_url: String,
}

impl DiscordPlatform {
    pub fn new(bot_token: &str) -> Result<Self> {
        if bot_token.trim().is_empty() {
            return Err(PlatformError::InvalidInput(
                "discord bot token is required".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(DISCORD_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            bot_token: bot_token.to_string(),
            api_base_url: DISCORD_API_BASE_URL.to_string(),
        })
    }

    pub fn with_api_base_url(mut self, api_base_url: &str) -> Self {
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base_url)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(PlatformError::Status { status, body })
    }
}

#[async_trait::async_trait]
impl ChatPlatform for DiscordPlatform {
    fn platform_id(&self) -> &str {
        "discord"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(channel_id = %channel_id))]
    async fn create_message(
        &self,
        channel_id: &ChannelId,
        embed: &Embed,
        components: &[ActionRow],
    ) -> Result<MessageRef> {
        let url = self.api_url(&format!("/channels/{channel_id}/messages"));
        let body = serde_json::json!({
            "embeds": [embed_payload(embed)],
            "components": components_payload(components),
        });
        let resp = self
            .http
            .post(url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;
        let payload: serde_json::Value = resp.json().await?;
        message_ref_from_payload(payload)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(channel_id = %channel_id, message_id = %message_id))]
    async fn edit_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        embed: &Embed,
    ) -> Result<()> {
        let url = self.api_url(&format!("/channels/{channel_id}/messages/{message_id}"));
        let body = serde_json::json!({ "embeds": [embed_payload(embed)] });
        let resp = self
            .http
            .patch(url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(channel_id = %channel_id, message_id = %message_id))]
    async fn delete_message(&self, channel_id: &ChannelId, message_id: &MessageId) -> Result<()> {
        let url = self.api_url(&format!("/channels/{channel_id}/messages/{message_id}"));
        let resp = self
            .http
            .delete(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::ensure_success(resp).await?;
        Ok(())
    }
}

fn embed_payload(embed: &Embed) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = embed
        .fields
        .iter()
        .flatten()
        .map(|field| {
            serde_json::json!({
                "name": field.name,
                "value": field.value,
                "inline": field.inline,
            })
        })
        .collect();

    let mut payload = serde_json::json!({ "fields": fields });
    if let Some(title) = &embed.title {
        payload["title"] = serde_json::Value::String(title.clone());
    }
    if let Some(description) = &embed.description {
        payload["description"] = serde_json::Value::String(description.clone());
    }
    if let Some(color) = embed.color {
        payload["color"] = serde_json::Value::from(color);
    }
    payload
}

fn components_payload(rows: &[ActionRow]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = rows
        .iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let buttons: Vec<serde_json::Value> = row
                .buttons
                .iter()
                .map(|button| {
                    serde_json::json!({
                        "type": DISCORD_BUTTON_TYPE,
                        "style": button.style.wire_value(),
                        "label": button.label,
                        "custom_id": button.custom_id,
                    })
                })
                .collect();
            serde_json::json!({ "type": DISCORD_ACTION_ROW_TYPE, "components": buttons })
        })
        .collect();
    serde_json::Value::Array(rows)
}

#[derive(Debug, Deserialize)]
struct DiscordMessage {
    id: String,
    channel_id: String,
}

fn message_ref_from_payload(payload: serde_json::Value) -> Result<MessageRef> {
    let message: DiscordMessage = serde_json::from_value(payload)?;
    if message.id.is_empty() || message.channel_id.is_empty() {
        return Err(PlatformError::ResponseFormat(
            "discord message payload missing id or channel_id".to_string(),
        ));
    }
    Ok(MessageRef {
        id: message.id.into(),
        channel_id: message.channel_id.into(),
    })
}
