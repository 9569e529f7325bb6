//! One-shot CLI operations against the configured platform.

use crate::catalog::DefaultCatalog;
use crate::commands::{StartStatus, start_response};
use crate::config::BeaconConfig;
use crate::session::SessionScope;
use crate::status::StatusService;
use anyhow::Result;
use beacon_core::{StatusMessageRecord, TracingMetrics};
use beacon_platform::{
    ActionRow, Button, ButtonStyle, ChannelId, ChatPlatform, DiscordPlatform, Embed, EmbedField,
    GuildId, MessageRef, UserId,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const FLUSH_GRACE: Duration = Duration::from_millis(500);

pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let cfg = BeaconConfig::load(config_path).await?;
    let policy = cfg.status_policy()?;
    tracing::info!(
        debounce = ?policy.debounce,
        stale_after_secs = policy.stale_after.num_seconds(),
        max_active_sessions = cfg.sessions.max_active,
        bot_token_set = !cfg.discord.bot_token.trim().is_empty(),
        "config ok"
    );
    Ok(())
}

fn discord_platform(cfg: &BeaconConfig) -> Result<DiscordPlatform> {
    let mut platform = DiscordPlatform::new(cfg.require_bot_token()?)?;
    if let Some(base) = cfg.discord.api_base_url.as_deref() {
        platform = platform.with_api_base_url(base);
    }
    Ok(platform)
}

/// Walks one status message through its whole lifecycle: create, a burst of
/// updates that collapses into one edit, then teardown.
pub async fn post_status(
    config_path: Option<PathBuf>,
    channel: &str,
    leader: &str,
    title: &str,
) -> Result<()> {
    let cfg = BeaconConfig::load(config_path).await?;
    let platform: Arc<dyn ChatPlatform> = Arc::new(discord_platform(&cfg)?);
    tracing::info!(platform = platform.platform_id(), channel, "posting status message");
    let service = StatusService::new(&cfg, platform, Arc::new(TracingMetrics))?;

    let guild = GuildId::from("cli");
    let voice: ChannelId = channel.into();
    let admitted = service.admit(&guild, Some(&voice)).await;
    let reply = start_response(&admitted, &DefaultCatalog);
    let reply_json = serde_json::to_string(&reply)?;
    tracing::info!(
        private = reply.is_private(),
        reply = %reply_json,
        "start reply rendered"
    );
    if !matches!(admitted, StartStatus::Success(_)) {
        return Err(anyhow::anyhow!("session not admitted: {admitted:?}"));
    }

    let scope = SessionScope::new(guild, voice);
    let leader: UserId = leader.into();
    let message = service
        .publish(
            &scope,
            &channel.into(),
            &leader,
            &status_embed(title, &leader, "lobby"),
            &[leave_row()],
        )
        .await?;
    let sessions = service.sessions().list().await;
    tracing::info!(
        message_id = %message.id,
        active_sessions = service.sessions().active_count(),
        sessions = ?sessions,
        "status message posted"
    );

    for phase in ["tasks", "discussion"] {
        let outcome = service
            .update(&scope, status_embed(title, &leader, phase))
            .await;
        tracing::info!(phase, ?outcome, "status update submitted");
    }
    tokio::time::sleep(service.dispatcher().policy().debounce + FLUSH_GRACE).await;

    let deleted = service.end(&scope).await;
    tracing::info!(deleted, "status message removed");
    Ok(())
}

/// Best-effort removal of a status message left behind by an earlier run.
pub async fn delete_status(
    config_path: Option<PathBuf>,
    channel: &str,
    message: &str,
) -> Result<()> {
    let cfg = BeaconConfig::load(config_path).await?;
    let mut record = stored_record(channel, message)?;
    let platform = discord_platform(&cfg)?;
    if !record.delete(&platform, true).await {
        return Err(anyhow::anyhow!(
            "delete of message {message} in channel {channel} failed"
        ));
    }
    Ok(())
}

fn stored_record(channel: &str, message: &str) -> Result<StatusMessageRecord> {
    let record = StatusMessageRecord::from_parts(
        MessageRef {
            id: message.trim().into(),
            channel_id: channel.trim().into(),
        },
        UserId::default(),
        Utc::now(),
    );
    if !record.exists() {
        return Err(anyhow::anyhow!(
            "both a channel id and a message id are required (channel={channel:?}, message={message:?})"
        ));
    }
    Ok(record)
}

fn status_embed(title: &str, leader: &UserId, phase: &str) -> Embed {
    Embed::titled(title)
        .with_field(EmbedField::new("Leader", format!("<@{leader}>")).inline())
        .with_field(EmbedField::new("Phase", phase).inline())
}

fn leave_row() -> ActionRow {
    ActionRow::new(vec![Button {
        custom_id: "select-color:x".to_string(),
        label: "unlink".to_string(),
        style: ButtonStyle::Danger,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_embed_passes_validation() {
        let embed = status_embed("Among Us", &"42".into(), "lobby");
        assert!(beacon_core::is_valid(&embed));
        assert_eq!(embed.fields.len(), 2);
    }

    #[test]
    fn stored_record_requires_both_ids() {
        assert!(stored_record("c1", "").is_err());
        assert!(stored_record("  ", "m1").is_err());

        let record = stored_record("c1", "m1").expect("both ids set");
        assert_eq!(record.message_id().as_str(), "m1");
        assert_eq!(record.channel_id().as_str(), "c1");
    }

    #[test]
    fn discord_platform_requires_token() {
        assert!(discord_platform(&BeaconConfig::default()).is_err());
    }
}
