//! Session registry keyed by (guild, voice channel).

use beacon_core::StatusMessageRecord;
use beacon_platform::{ActionRow, ChannelId, GuildId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StatusSession {
    pub id: Uuid,
    pub record: StatusMessageRecord,
    /// Rows attached to the status message, reused when it is recreated.
    pub components: Vec<ActionRow>,
    pub connect_code: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl StatusSession {
    fn new() -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4();
        Self {
            id,
            record: StatusMessageRecord::empty(),
            components: Vec::new(),
            connect_code: connect_code_from(id),
            created_at: now,
            last_active: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}

/// Eight uppercase hex characters derived from the session id.
fn connect_code_from(id: Uuid) -> String {
    id.simple().to_string()[..8].to_ascii_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionScope {
    guild_id: GuildId,
    voice_channel_id: ChannelId,
}

impl SessionScope {
    pub fn new(guild_id: impl Into<GuildId>, voice_channel_id: impl Into<ChannelId>) -> Self {
        Self {
            guild_id: guild_id.into(),
            voice_channel_id: voice_channel_id.into(),
        }
    }

    pub fn guild_id(&self) -> &str {
        self.guild_id.as_str()
    }

    pub fn voice_channel_id(&self) -> &str {
        self.voice_channel_id.as_str()
    }
}

pub type SessionHandle = Arc<Mutex<StatusSession>>;

#[derive(Default)]
pub struct SessionManager {
    sessions: DashMap<SessionScope, SessionHandle>,
    /// Serializes the limit check with the insert it guards.
    admission: Mutex<()>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `scope`, registering it if the registry holds
    /// fewer than `max_active` sessions. A registered scope is always returned.
    /// On refusal the error carries the number of active sessions.
    pub async fn admit(
        &self,
        scope: &SessionScope,
        max_active: usize,
    ) -> Result<SessionHandle, usize> {
        let _admission = self.admission.lock().await;
        if let Some(handle) = self.get(scope) {
            return Ok(handle);
        }
        let active = self.sessions.len();
        if active >= max_active {
            return Err(active);
        }
        let handle = Arc::new(Mutex::new(StatusSession::new()));
        self.sessions.insert(scope.clone(), handle.clone());
        Ok(handle)
    }

    pub fn get(&self, scope: &SessionScope) -> Option<SessionHandle> {
        self.sessions.get(scope).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, scope: &SessionScope) -> Option<SessionHandle> {
        self.sessions.remove(scope).map(|(_, handle)| handle)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub async fn list(&self) -> Vec<SessionSummary> {
        let entries: Vec<(SessionScope, SessionHandle)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut out = Vec::with_capacity(entries.len());
        for (scope, handle) in entries {
            let session = handle.lock().await;
            out.push(SessionSummary {
                id: session.id,
                guild_id: scope.guild_id().to_string(),
                voice_channel_id: scope.voice_channel_id().to_string(),
                message_id: session
                    .record
                    .exists()
                    .then(|| session.record.message_id().to_string()),
                created_at: session.created_at,
                last_active: session.last_active,
            });
        }
        out.sort_by_key(|s| s.last_active);
        out.reverse();
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub guild_id: String,
    pub voice_channel_id: String,
    pub message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
