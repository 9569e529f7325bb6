use crate::coalescer::EditCoalescer;
use crate::metrics::{MetricKind, MetricsSink};
use crate::policy::StatusPolicy;
use crate::record::StatusMessageRecord;
use beacon_platform::{ActionRow, ChannelId, ChatPlatform, Embed, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The stale message was replaced by a freshly created one.
    Refreshed,
    /// The stale message was dropped but its replacement could not be created.
    RefreshFailed,
    /// A new debounce cycle was started for the message.
    EditScheduled,
    /// The embed replaced the pending content of a running cycle.
    EditCoalesced,
    /// The embed failed validation and was discarded.
    Rejected,
    /// The session has no live status message.
    Missing,
}

/// Chooses between a coalesced edit and a full recreation for every status update.
pub struct Dispatcher {
    platform: Arc<dyn ChatPlatform>,
    coalescer: EditCoalescer,
    metrics: Arc<dyn MetricsSink>,
    policy: StatusPolicy,
}

impl Dispatcher {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        metrics: Arc<dyn MetricsSink>,
        policy: StatusPolicy,
    ) -> Self {
        let coalescer = EditCoalescer::new(platform.clone(), policy.debounce);
        Self {
            platform,
            coalescer,
            metrics,
            policy,
        }
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    pub async fn dispatch(
        &self,
        record: &mut StatusMessageRecord,
        embed: Embed,
        components: &[ActionRow],
    ) -> DispatchOutcome {
        self.dispatch_at(record, embed, components, Utc::now()).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(message_id = %record.message_id()))]
    pub async fn dispatch_at(
        &self,
        record: &mut StatusMessageRecord,
        embed: Embed,
        components: &[ActionRow],
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let Some(target) = record.message_ref() else {
            return DispatchOutcome::Missing;
        };

        if record.is_stale(now, self.policy.stale_after) {
            return self.refresh(record, &embed, components).await;
        }

        if !crate::validate::is_valid(&embed) {
            return DispatchOutcome::Rejected;
        }
        if self.coalescer.submit(&target, embed).await {
            self.metrics.record_event(MetricKind::MessageEdit, 1);
            DispatchOutcome::EditScheduled
        } else {
            DispatchOutcome::EditCoalesced
        }
    }

    /// Creates the status message for a record that has none.
    pub async fn publish(
        &self,
        record: &mut StatusMessageRecord,
        channel_id: &ChannelId,
        leader_id: &UserId,
        embed: &Embed,
        components: &[ActionRow],
    ) -> bool {
        let created = record
            .create(
                self.platform.as_ref(),
                channel_id,
                leader_id,
                embed,
                components,
            )
            .await;
        if created {
            self.metrics.record_event(MetricKind::MessageCreate, 1);
        }
        created
    }

    /// Withdraws any pending edit and deletes the message.
    pub async fn retire(&self, record: &mut StatusMessageRecord, reset: bool) -> bool {
        if record.exists() {
            self.coalescer.remove_pending(record.message_id()).await;
        }
        let deleted = record.delete(self.platform.as_ref(), reset).await;
        if deleted {
            self.metrics.record_event(MetricKind::MessageDelete, 1);
        }
        deleted
    }

    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(platform = self.platform.platform_id(), message_id = %record.message_id())
    )]
    async fn refresh(
        &self,
        record: &mut StatusMessageRecord,
        embed: &Embed,
        components: &[ActionRow],
    ) -> DispatchOutcome {
        let channel_id = record.channel_id().clone();
        let leader_id = record.leader_id().clone();

        self.retire(record, true).await;
        if self
            .publish(record, &channel_id, &leader_id, embed, components)
            .await
        {
            tracing::info!(new_message_id = %record.message_id(), "stale status message refreshed");
            DispatchOutcome::Refreshed
        } else {
            DispatchOutcome::RefreshFailed
        }
    }
}
