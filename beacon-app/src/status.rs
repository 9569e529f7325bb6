//! Per-session status message service: admission, publish, update, teardown.

use crate::commands::{ConnectInfo, LockoutInfo, StartStatus};
use crate::config::BeaconConfig;
use crate::session::{SessionManager, SessionScope};
use anyhow::Result;
use beacon_core::{DispatchOutcome, Dispatcher, MetricsSink};
use beacon_platform::{ActionRow, ChannelId, ChatPlatform, Embed, GuildId, MessageRef, UserId};
use std::sync::Arc;

pub struct StatusService {
    sessions: Arc<SessionManager>,
    dispatcher: Dispatcher,
    max_active: usize,
    host_url: String,
}

impl StatusService {
    pub fn new(
        cfg: &BeaconConfig,
        platform: Arc<dyn ChatPlatform>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let policy = cfg.status_policy()?;
        tracing::debug!(platform = platform.platform_id(), "status service ready");
        Ok(Self {
            sessions: Arc::new(SessionManager::new()),
            dispatcher: Dispatcher::new(platform, metrics, policy),
            max_active: cfg.sessions.max_active,
            host_url: cfg.connect.host_url.clone(),
        })
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Decides whether a start request may open a session for `voice_channel`.
    /// A successful admission registers the session.
    #[tracing::instrument(level = "info", skip_all, fields(guild_id = %guild_id))]
    pub async fn admit(&self, guild_id: &GuildId, voice_channel: Option<&ChannelId>) -> StartStatus {
        let Some(voice_channel) = voice_channel else {
            return StartStatus::NoVoiceChannel;
        };
        let scope = SessionScope::new(guild_id.clone(), voice_channel.clone());

        let handle = match self.sessions.admit(&scope, self.max_active).await {
            Ok(handle) => handle,
            Err(active_sessions) => {
                tracing::warn!(
                    active_sessions,
                    max_sessions = self.max_active,
                    "session limit reached"
                );
                return StartStatus::Lockout(LockoutInfo {
                    active_sessions,
                    max_sessions: self.max_active,
                });
            }
        };
        let connect_code = handle.lock().await.connect_code.clone();
        StartStatus::Success(ConnectInfo {
            host_url: self.host_url.clone(),
            connect_code,
        })
    }

    /// Posts the status message of an admitted session, replacing any previous
    /// one. `components` stay with the session for later recreations.
    #[tracing::instrument(level = "info", skip_all, fields(channel_id = %channel_id))]
    pub async fn publish(
        &self,
        scope: &SessionScope,
        channel_id: &ChannelId,
        leader_id: &UserId,
        embed: &Embed,
        components: &[ActionRow],
    ) -> Result<MessageRef> {
        let Some(handle) = self.sessions.get(scope) else {
            return Err(anyhow::anyhow!(
                "no admitted session for voice channel {}",
                scope.voice_channel_id()
            ));
        };
        let mut session = handle.lock().await;
        if session.record.exists() {
            self.dispatcher.retire(&mut session.record, true).await;
        }

        let created = self
            .dispatcher
            .publish(&mut session.record, channel_id, leader_id, embed, components)
            .await;
        session.touch();
        if !created {
            session.components.clear();
            return Err(anyhow::anyhow!(
                "status message create failed in channel {channel_id}"
            ));
        }
        session.components = components.to_vec();
        session
            .record
            .message_ref()
            .ok_or_else(|| anyhow::anyhow!("status message record missing after create"))
    }

    /// Routes a state change to the session's status message. A recreated
    /// message carries the rows given at publish.
    pub async fn update(&self, scope: &SessionScope, embed: Embed) -> DispatchOutcome {
        let Some(handle) = self.sessions.get(scope) else {
            return DispatchOutcome::Missing;
        };
        let mut guard = handle.lock().await;
        let session = &mut *guard;
        let outcome = self
            .dispatcher
            .dispatch(&mut session.record, embed, &session.components)
            .await;
        session.touch();
        tracing::debug!(?outcome, "status update dispatched");
        outcome
    }

    /// Ends the session. Local state is dropped even if the remote delete fails.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn end(&self, scope: &SessionScope) -> bool {
        let Some(handle) = self.sessions.remove(scope) else {
            return false;
        };
        let mut session = handle.lock().await;
        self.dispatcher.retire(&mut session.record, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::testing::{PlatformCall, RecordingPlatform};
    use beacon_core::{CountingMetrics, MetricKind, StatusMessageRecord};
    use beacon_platform::{Button, ButtonStyle, EmbedField, MessageId};
    use chrono::Utc;
    use std::time::Duration;

    fn service(max_active: usize) -> (Arc<RecordingPlatform>, Arc<CountingMetrics>, StatusService) {
        let mut cfg: BeaconConfig = toml::from_str(
            r#"
[connect]
host_url = "https://capture.example.com:443"
"#,
        )
        .expect("parse test config");
        cfg.sessions.max_active = max_active;
        let platform = Arc::new(RecordingPlatform::default());
        let metrics = Arc::new(CountingMetrics::default());
        let service =
            StatusService::new(&cfg, platform.clone(), metrics.clone()).expect("service builds");
        (platform, metrics, service)
    }

    fn lobby(host: &str) -> Embed {
        Embed::titled("Lobby").with_field(EmbedField::new("Host", host))
    }

    fn unlink_row() -> ActionRow {
        ActionRow::new(vec![Button {
            custom_id: "select-color:x".to_string(),
            label: "unlink".to_string(),
            style: ButtonStyle::Danger,
        }])
    }

    async fn admitted(service: &StatusService, scope: &SessionScope) {
        let status = service
            .admit(
                &GuildId::from(scope.guild_id()),
                Some(&ChannelId::from(scope.voice_channel_id())),
            )
            .await;
        assert!(matches!(status, StartStatus::Success(_)), "{status:?}");
    }

    #[tokio::test]
    async fn admit_requires_voice_channel_and_enforces_limit() {
        let (_, _, service) = service(1);
        let guild = GuildId::from("g1");

        assert_eq!(
            service.admit(&guild, None).await,
            StartStatus::NoVoiceChannel
        );

        let first = service.admit(&guild, Some(&"v1".into())).await;
        let StartStatus::Success(info) = first else {
            panic!("first session should be admitted: {first:?}");
        };
        assert_eq!(info.host_url, "https://capture.example.com:443");
        assert_eq!(info.connect_code.len(), 8);

        let again = service.admit(&guild, Some(&"v1".into())).await;
        assert_eq!(again, StartStatus::Success(info), "re-admitting keeps the code");

        assert_eq!(
            service.admit(&guild, Some(&"v2".into())).await,
            StartStatus::Lockout(LockoutInfo {
                active_sessions: 1,
                max_sessions: 1,
            })
        );
    }

    #[tokio::test]
    async fn publish_requires_an_admitted_session() {
        let (platform, _, service) = service(5);
        let scope = SessionScope::new("g1", "v1");

        let result = service
            .publish(&scope, &"text".into(), &"leader".into(), &lobby("alice"), &[])
            .await;
        assert!(result.is_err());
        assert!(platform.calls().is_empty());
        assert_eq!(service.sessions().active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_publish_update_end() {
        let (platform, metrics, service) = service(5);
        let scope = SessionScope::new("g1", "v1");
        admitted(&service, &scope).await;

        let message = service
            .publish(&scope, &"text".into(), &"leader".into(), &lobby("alice"), &[])
            .await
            .expect("publish succeeds");
        assert_eq!(message.id.as_str(), "msg-1");

        assert_eq!(
            service.update(&scope, lobby("bob")).await,
            DispatchOutcome::EditScheduled
        );
        assert_eq!(
            service.update(&scope, lobby("carol")).await,
            DispatchOutcome::EditCoalesced
        );
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            platform.edits(),
            vec![(MessageId::from("msg-1"), lobby("carol"))]
        );

        assert!(service.end(&scope).await);
        assert!(service.sessions().get(&scope).is_none());
        assert_eq!(
            service.update(&scope, lobby("dave")).await,
            DispatchOutcome::Missing
        );
        assert_eq!(metrics.count(MetricKind::MessageCreate), 1);
        assert_eq!(metrics.count(MetricKind::MessageEdit), 1);
        assert_eq!(metrics.count(MetricKind::MessageDelete), 1);
    }

    #[tokio::test]
    async fn stale_update_recreates_with_published_rows() {
        let (platform, _, service) = service(5);
        let scope = SessionScope::new("g1", "v1");
        admitted(&service, &scope).await;
        let message = service
            .publish(
                &scope,
                &"text".into(),
                &"leader".into(),
                &lobby("alice"),
                &[unlink_row()],
            )
            .await
            .expect("publish succeeds");

        let handle = service.sessions().get(&scope).expect("session registered");
        handle.lock().await.record = StatusMessageRecord::from_parts(
            message,
            "leader".into(),
            Utc::now() - chrono::Duration::hours(2),
        );

        assert_eq!(
            service.update(&scope, lobby("bob")).await,
            DispatchOutcome::Refreshed
        );
        let calls = platform.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(
            &calls[1],
            PlatformCall::Delete { message_id, .. } if message_id.as_str() == "msg-1"
        ));
        assert!(matches!(
            &calls[2],
            PlatformCall::Create { embed, rows: 1, .. } if *embed == lobby("bob")
        ));
    }

    #[tokio::test]
    async fn republish_replaces_previous_message() {
        let (platform, _, service) = service(5);
        let scope = SessionScope::new("g1", "v1");
        admitted(&service, &scope).await;

        service
            .publish(&scope, &"text".into(), &"leader".into(), &lobby("alice"), &[])
            .await
            .expect("first publish");
        let second = service
            .publish(&scope, &"text".into(), &"leader".into(), &lobby("alice"), &[])
            .await
            .expect("second publish");

        assert_eq!(second.id.as_str(), "msg-2");
        assert_eq!(platform.deletes(), vec![MessageId::from("msg-1")]);
    }

    #[tokio::test]
    async fn end_drops_session_even_when_delete_fails() {
        let (platform, _, service) = service(5);
        platform.fail_delete(true);
        let scope = SessionScope::new("g1", "v1");
        admitted(&service, &scope).await;
        service
            .publish(&scope, &"text".into(), &"leader".into(), &lobby("alice"), &[])
            .await
            .expect("publish");

        assert!(!service.end(&scope).await);
        assert!(service.sessions().get(&scope).is_none());
        assert!(!service.end(&scope).await, "second end is a no-op");
    }
}
