use dashmap::DashMap;
use poise::serenity_prelude::GuildId;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::session::VoiceSession;

/// A session behind its guild's lock.
pub type SharedSession = Arc<Mutex<VoiceSession>>;

/// Maps each guild to at most one voice session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<GuildId, SharedSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SharedSession> {
        self.sessions
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Existing session for the guild, or a fresh Idle one inserted in its place.
    pub fn get_or_create(&self, guild_id: GuildId) -> SharedSession {
        let entry = self
            .sessions
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(VoiceSession::new(guild_id))));
        Arc::clone(entry.value())
    }

    /// Drop the guild's session. Removing an absent guild is a no-op.
    pub fn remove(&self, guild_id: GuildId) -> Option<SharedSession> {
        self.sessions.remove(&guild_id).map(|(_, session)| session)
    }

    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
