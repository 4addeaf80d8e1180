//! The media-playback collaborator seam.
//!
//! The session owns the queue, the now-playing track and the loop flag; an
//! engine only ever sounds one track per guild and reports back through
//! [`EngineEvent`]s.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use poise::serenity_prelude::{ChannelId, GuildId};
use std::time::Duration;

use super::music_manager::MusicResult;
use super::session::Track;

/// Display metadata resolved for a query before it is queued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub url: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
}

impl TrackMetadata {
    /// Metadata carrying only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Events pushed by an engine back to the music manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The track started under `play_id` reached its end.
    Finished { guild_id: GuildId, play_id: u64 },
    /// The track started under `play_id` failed and cannot continue.
    Failed {
        guild_id: GuildId,
        play_id: u64,
        reason: String,
    },
    /// The voice connection dropped without us asking for it.
    ConnectionLost { guild_id: GuildId },
}

impl EngineEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            Self::Finished { guild_id, .. }
            | Self::Failed { guild_id, .. }
            | Self::ConnectionLost { guild_id } => *guild_id,
        }
    }
}

/// A voice-media backend that can join a channel and sound a single track.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Look up a search string or URL and return its display metadata.
    async fn resolve(&self, query: &str) -> MusicResult<TrackMetadata>;

    /// Join `channel_id` in `guild_id`.
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()>;

    /// Replace whatever is sounding in `guild_id` with `track`.
    ///
    /// Completion and failure of the track must be reported with the given
    /// `play_id`.
    async fn play(&self, guild_id: GuildId, track: &Track, play_id: u64) -> MusicResult<()>;

    async fn pause(&self, guild_id: GuildId) -> MusicResult<()>;

    async fn resume(&self, guild_id: GuildId) -> MusicResult<()>;

    /// Silence the guild without leaving the channel.
    async fn stop(&self, guild_id: GuildId) -> MusicResult<()>;

    /// Leave the voice channel. Leaving a guild we are not in is not an error.
    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()>;
}
