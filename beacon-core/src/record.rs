use beacon_platform::{ActionRow, ChannelId, ChatPlatform, Embed, MessageId, MessageRef, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity and age of the live status message owned by a session.
///
/// Either both identifiers are set or neither is. Fields change only through
/// [`create`](Self::create) and [`delete`](Self::delete), which replace them
/// all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessageRecord {
    message_id: MessageId,
    channel_id: ChannelId,
    leader_id: UserId,
    #[serde(with = "chrono::serde::ts_seconds")]
    created_at: DateTime<Utc>,
}

impl StatusMessageRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rebuilds a record for a message that already exists on the platform.
    /// A reference missing either id yields the empty record.
    pub fn from_parts(message: MessageRef, leader_id: UserId, created_at: DateTime<Utc>) -> Self {
        if message.id.is_empty() || message.channel_id.is_empty() {
            return Self::empty();
        }
        Self {
            message_id: message.id,
            channel_id: message.channel_id,
            leader_id,
            created_at,
        }
    }

    pub fn exists(&self) -> bool {
        !self.message_id.is_empty() && !self.channel_id.is_empty()
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    pub fn leader_id(&self) -> &UserId {
        &self.leader_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn message_ref(&self) -> Option<MessageRef> {
        self.exists().then(|| MessageRef {
            id: self.message_id.clone(),
            channel_id: self.channel_id.clone(),
        })
    }

    /// True once the message is strictly older than `stale_after`; a message
    /// exactly `stale_after` old can still be edited.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: chrono::Duration) -> bool {
        now.signed_duration_since(self.created_at) > stale_after
    }

    /// Posts a new message and adopts its identity. On failure the record is
    /// left exactly as it was.
    #[tracing::instrument(level = "debug", skip_all, fields(channel_id = %channel_id))]
    pub async fn create(
        &mut self,
        platform: &dyn ChatPlatform,
        channel_id: &ChannelId,
        leader_id: &UserId,
        embed: &Embed,
        components: &[ActionRow],
    ) -> bool {
        match platform
            .create_message(channel_id, embed, components)
            .await
        {
            Ok(message) => {
                *self = Self::from_parts(message, leader_id.clone(), Utc::now());
                tracing::debug!(message_id = %self.message_id, "status message created");
                true
            }
            Err(error) => {
                tracing::warn!(%error, "status message create failed");
                false
            }
        }
    }

    /// Removes the remote message. With `reset` the record is emptied even
    /// when the platform call fails.
    #[tracing::instrument(level = "debug", skip_all, fields(message_id = %self.message_id))]
    pub async fn delete(&mut self, platform: &dyn ChatPlatform, reset: bool) -> bool {
        let deleted = if self.exists() {
            match platform
                .delete_message(&self.channel_id, &self.message_id)
                .await
            {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(%error, "status message delete failed");
                    false
                }
            }
        } else {
            false
        };
        if reset {
            *self = Self::empty();
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingPlatform, titled};

    fn record_created_at(created_at: DateTime<Utc>) -> StatusMessageRecord {
        StatusMessageRecord::from_parts(
            MessageRef {
                id: "m1".into(),
                channel_id: "c1".into(),
            },
            "leader".into(),
            created_at,
        )
    }

    #[test]
    fn exists_requires_both_identifiers() {
        assert!(!StatusMessageRecord::empty().exists());
        assert!(StatusMessageRecord::empty().message_ref().is_none());

        let record = record_created_at(Utc::now());
        assert!(record.exists());
        assert_eq!(
            record.message_ref().map(|m| m.id),
            Some(MessageId::from("m1"))
        );
    }

    #[test]
    fn half_set_reference_yields_empty_record() {
        let no_channel = StatusMessageRecord::from_parts(
            MessageRef {
                id: "m1".into(),
                channel_id: ChannelId::default(),
            },
            "leader".into(),
            Utc::now(),
        );
        assert!(!no_channel.exists());
        assert!(no_channel.message_id().is_empty());
        assert!(no_channel.leader_id().is_empty());

        let no_message = StatusMessageRecord::from_parts(
            MessageRef {
                id: MessageId::default(),
                channel_id: "c1".into(),
            },
            "leader".into(),
            Utc::now(),
        );
        assert!(!no_message.exists());
        assert!(no_message.channel_id().is_empty());
    }

    #[test]
    fn staleness_boundary_is_exclusive() {
        let created_at = Utc::now();
        let record = record_created_at(created_at);
        let hour = chrono::Duration::hours(1);

        assert!(!record.is_stale(created_at + chrono::Duration::seconds(3599), hour));
        assert!(
            !record.is_stale(created_at + hour, hour),
            "exactly one hour old is still editable"
        );
        assert!(record.is_stale(created_at + chrono::Duration::seconds(3601), hour));
        assert!(record.is_stale(
            created_at + hour + chrono::Duration::milliseconds(1),
            hour
        ));
    }

    #[test]
    fn record_serializes_creation_time_as_unix_seconds() {
        let created_at = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let record = record_created_at(created_at);
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["created_at"], 1_700_000_000);
        assert_eq!(json["message_id"], "m1");

        let back: StatusMessageRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn create_populates_every_field() {
        let platform = RecordingPlatform::default();
        let mut record = StatusMessageRecord::empty();
        let before = Utc::now();

        let ok = record
            .create(
                &platform,
                &"c1".into(),
                &"leader".into(),
                &titled("Lobby"),
                &[],
            )
            .await;

        assert!(ok);
        assert!(record.exists());
        assert_eq!(record.channel_id().as_str(), "c1");
        assert_eq!(record.leader_id().as_str(), "leader");
        assert!(record.created_at() >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn failed_create_leaves_record_untouched() {
        let platform = RecordingPlatform::default();
        platform.fail_create(true);

        let mut empty = StatusMessageRecord::empty();
        assert!(
            !empty
                .create(&platform, &"c1".into(), &"leader".into(), &titled("Lobby"), &[])
                .await
        );
        assert_eq!(empty, StatusMessageRecord::empty());

        let original = record_created_at(Utc::now());
        let mut existing = original.clone();
        assert!(
            !existing
                .create(&platform, &"c2".into(), &"other".into(), &titled("Lobby"), &[])
                .await
        );
        assert_eq!(existing, original);
    }

    #[tokio::test]
    async fn delete_on_empty_record_makes_no_call() {
        let platform = RecordingPlatform::default();
        let mut record = StatusMessageRecord::empty();

        assert!(!record.delete(&platform, true).await);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_with_reset_empties_record_even_on_failure() {
        let platform = RecordingPlatform::default();
        platform.fail_delete(true);
        let mut record = record_created_at(Utc::now());

        assert!(!record.delete(&platform, true).await);
        assert_eq!(platform.deletes(), vec![MessageId::from("m1")]);
        assert!(!record.exists());
        assert_eq!(record, StatusMessageRecord::empty());
    }

    #[tokio::test]
    async fn delete_without_reset_keeps_identity() {
        let platform = RecordingPlatform::default();
        let original = record_created_at(Utc::now());
        let mut record = original.clone();

        assert!(record.delete(&platform, false).await);
        assert_eq!(record, original);
    }
}
