//! Debounced, last-write-wins edits of status messages.
//!
//! The first valid submission for a message starts one flush task; later
//! submissions inside the window only replace the pending embed. The flush
//! task sleeps for the window, takes whatever embed is pending and sends it
//! as a single edit. A message keeps its slot until its flush task wakes, even
//! when the pending embed was withdrawn, so a message never has two flush tasks.

use crate::validate;
use beacon_platform::{ChatPlatform, Embed, MessageId, MessageRef};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Key present: a flush task is sleeping for that message. Value: the embed it
/// will send, or `None` once withdrawn.
type PendingEdits = Arc<Mutex<HashMap<MessageId, Option<Embed>>>>;

pub struct EditCoalescer {
    platform: Arc<dyn ChatPlatform>,
    window: Duration,
    pending: PendingEdits,
}

impl EditCoalescer {
    pub fn new(platform: Arc<dyn ChatPlatform>, window: Duration) -> Self {
        Self {
            platform,
            window,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queues `embed` as the next content of `target`.
    ///
    /// Returns `true` only when this call started a new flush cycle. Invalid
    /// embeds are dropped without touching pending state.
    pub async fn submit(&self, target: &MessageRef, embed: Embed) -> bool {
        if let Err(reason) = validate::validate(&embed) {
            tracing::debug!(message_id = %target.id, %reason, "dropping invalid status edit");
            return false;
        }

        let mut pending = self.pending.lock().await;
        let new_cycle = !pending.contains_key(&target.id);
        if new_cycle {
            self.spawn_flush(target.clone());
            tracing::debug!(message_id = %target.id, window = ?self.window, "status edit cycle started");
        } else {
            tracing::debug!(message_id = %target.id, "status edit coalesced");
        }
        pending.insert(target.id.clone(), Some(embed));
        new_cycle
    }

    /// Withdraws the pending embed for `message_id` so its flush task finds
    /// nothing to send. The flush task keeps its slot until it wakes.
    pub async fn remove_pending(&self, message_id: &MessageId) -> bool {
        self.pending
            .lock()
            .await
            .get_mut(message_id)
            .and_then(Option::take)
            .is_some()
    }

    pub async fn is_pending(&self, message_id: &MessageId) -> bool {
        matches!(self.pending.lock().await.get(message_id), Some(Some(_)))
    }

    pub async fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .await
            .values()
            .filter(|embed| embed.is_some())
            .count()
    }

    fn spawn_flush(&self, target: MessageRef) {
        let platform = self.platform.clone();
        let pending = self.pending.clone();
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let embed = pending.lock().await.remove(&target.id).flatten();
            let Some(embed) = embed else {
                tracing::debug!(message_id = %target.id, "pending status edit was withdrawn");
                return;
            };

            match platform
                .edit_message(&target.channel_id, &target.id, &embed)
                .await
            {
                Ok(()) => tracing::debug!(message_id = %target.id, "status edit flushed"),
                Err(error) => {
                    tracing::warn!(message_id = %target.id, %error, "status edit flush failed")
                }
            }
        });
    }
}
