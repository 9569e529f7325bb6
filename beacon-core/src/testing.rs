//! Recording platform fake shared by the workspace's tests.

use beacon_platform::{
    ActionRow, ChannelId, ChatPlatform, Embed, MessageId, MessageRef, PlatformError, Result,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Create {
        channel_id: ChannelId,
        embed: Embed,
        rows: usize,
    },
    Edit {
        channel_id: ChannelId,
        message_id: MessageId,
        embed: Embed,
    },
    Delete {
        channel_id: ChannelId,
        message_id: MessageId,
    },
}

/// In-memory platform that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    next_id: AtomicU64,
    fail_create: AtomicBool,
    fail_edit: AtomicBool,
    fail_delete: AtomicBool,
}

impl RecordingPlatform {
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn edits(&self) -> Vec<(MessageId, Embed)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Edit {
                    message_id, embed, ..
                } => Some((message_id, embed)),
                _ => None,
            })
            .collect()
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, PlatformCall::Create { .. }))
            .count()
    }

    pub fn deletes(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Delete { message_id, .. } => Some(message_id),
                _ => None,
            })
            .collect()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_edit(&self, fail: bool) {
        self.fail_edit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    fn push(&self, call: PlatformCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn rejected() -> PlatformError {
        PlatformError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ChatPlatform for RecordingPlatform {
    fn platform_id(&self) -> &str {
        "recording"
    }

    async fn create_message(
        &self,
        channel_id: &ChannelId,
        embed: &Embed,
        components: &[ActionRow],
    ) -> Result<MessageRef> {
        self.push(PlatformCall::Create {
            channel_id: channel_id.clone(),
            embed: embed.clone(),
            rows: components.len(),
        });
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageRef {
            id: MessageId::new(format!("msg-{id}")),
            channel_id: channel_id.clone(),
        })
    }

    async fn edit_message(
        &self,
        channel_id: &ChannelId,
        message_id: &MessageId,
        embed: &Embed,
    ) -> Result<()> {
        self.push(PlatformCall::Edit {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
            embed: embed.clone(),
        });
        if self.fail_edit.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(())
    }

    async fn delete_message(&self, channel_id: &ChannelId, message_id: &MessageId) -> Result<()> {
        self.push(PlatformCall::Delete {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
        });
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(())
    }
}

pub fn titled(title: &str) -> Embed {
    Embed::titled(title)
}
