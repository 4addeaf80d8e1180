//! Recording fakes for the music core's collaborators

use async_trait::async_trait;
use nutcrack::commands::music::utils::announcer::{Announcer, Notice};
use nutcrack::commands::music::utils::music_manager::{MusicError, MusicResult};
use nutcrack::commands::music::utils::playback_engine::{PlaybackEngine, TrackMetadata};
use nutcrack::commands::music::utils::session::Track;
use poise::serenity_prelude::{ChannelId, GuildId};
use std::sync::Mutex;
use std::time::Duration;

/// Query that the fake engine cannot find.
pub const MISSING: &str = "missing";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Connect(GuildId, ChannelId),
    Play { name: String, play_id: u64 },
    Pause,
    Resume,
    Stop,
    Disconnect(GuildId),
}

/// Playback engine that accepts everything and remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybackEngine for RecordingEngine {
    async fn resolve(&self, query: &str) -> MusicResult<TrackMetadata> {
        if query == MISSING {
            return Err(MusicError::TrackLookup(query.to_string()));
        }
        Ok(TrackMetadata {
            title: query.to_string(),
            url: Some(format!("https://media.test/{}", query)),
            duration: Some(Duration::from_secs(180)),
            thumbnail: None,
        })
    }

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        self.record(EngineCall::Connect(guild_id, channel_id));
        Ok(())
    }

    async fn play(&self, _guild_id: GuildId, track: &Track, play_id: u64) -> MusicResult<()> {
        self.record(EngineCall::Play {
            name: track.name.clone(),
            play_id,
        });
        Ok(())
    }

    async fn pause(&self, _guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    async fn resume(&self, _guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Resume);
        Ok(())
    }

    async fn stop(&self, _guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Stop);
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()> {
        self.record(EngineCall::Disconnect(guild_id));
        Ok(())
    }
}

/// Announcer that keeps every notice instead of posting it.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    notices: Mutex<Vec<(ChannelId, Notice)>>,
}

impl RecordingAnnouncer {
    pub fn notices(&self) -> Vec<(ChannelId, Notice)> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn announce(&self, channel_id: ChannelId, notice: Notice) {
        self.notices.lock().unwrap().push((channel_id, notice));
    }
}
