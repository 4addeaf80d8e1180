use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, GuildId};
use songbird::input::{Compose, YoutubeDl};
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{CoreEvent, Event, EventContext, EventHandler, Songbird, TrackEvent};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use url::Url;

use super::music_manager::{MusicError, MusicResult};
use super::playback_engine::{EngineEvent, PlaybackEngine, TrackMetadata};
use super::session::Track;

/// Plays tracks through songbird, fetching audio with yt-dlp.
pub struct SongbirdEngine {
    songbird: Arc<Songbird>,
    http: reqwest::Client,
    tracks: DashMap<GuildId, TrackHandle>,
    events: UnboundedSender<EngineEvent>,
}

impl SongbirdEngine {
    pub fn new(
        songbird: Arc<Songbird>,
        http: reqwest::Client,
        events: UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            songbird,
            http,
            tracks: DashMap::new(),
            events,
        }
    }

    fn source_for(&self, query: &str) -> YoutubeDl<'static> {
        if Url::parse(query).is_ok() {
            YoutubeDl::new(self.http.clone(), query.to_string())
        } else {
            YoutubeDl::new_search(self.http.clone(), query.to_string())
        }
    }

    fn current_track(&self, guild_id: GuildId) -> MusicResult<TrackHandle> {
        self.tracks
            .get(&guild_id)
            .map(|entry| entry.value().clone())
            .ok_or(MusicError::NothingPlaying)
    }
}

#[async_trait]
impl PlaybackEngine for SongbirdEngine {
    async fn resolve(&self, query: &str) -> MusicResult<TrackMetadata> {
        let mut source = self.source_for(query);
        let metadata = source
            .aux_metadata()
            .await
            .map_err(|e| MusicError::TrackLookup(format!("{}: {}", query, e)))?;

        debug!("Resolved '{}' to {:?}", query, metadata.title);
        Ok(TrackMetadata {
            title: metadata.title.unwrap_or_else(|| query.to_string()),
            url: metadata.source_url,
            duration: metadata.duration,
            thumbnail: metadata.thumbnail,
        })
    }

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<()> {
        let call = self
            .songbird
            .join(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        let mut handler = call.lock().await;
        handler.add_global_event(
            Event::Core(CoreEvent::DriverDisconnect),
            DisconnectNotifier {
                guild_id,
                events: self.events.clone(),
            },
        );
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, track: &Track, play_id: u64) -> MusicResult<()> {
        let call = self.songbird.get(guild_id).ok_or(MusicError::NotConnected)?;
        let source = match &track.url {
            Some(url) => YoutubeDl::new(self.http.clone(), url.clone()),
            None => self.source_for(&track.source_query),
        };

        let handle = {
            let mut handler = call.lock().await;
            handler.stop();
            handler.play_input(source.into())
        };

        let notifier = TrackNotifier {
            guild_id,
            play_id,
            events: self.events.clone(),
        };
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(Event::Track(event), notifier.clone())
                .map_err(|e| MusicError::Playback(e.to_string()))?;
        }

        self.tracks.insert(guild_id, handle);
        Ok(())
    }

    async fn pause(&self, guild_id: GuildId) -> MusicResult<()> {
        self.current_track(guild_id)?
            .pause()
            .map_err(|e| MusicError::Playback(e.to_string()))
    }

    async fn resume(&self, guild_id: GuildId) -> MusicResult<()> {
        self.current_track(guild_id)?
            .play()
            .map_err(|e| MusicError::Playback(e.to_string()))
    }

    async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        self.tracks.remove(&guild_id);
        if let Some(call) = self.songbird.get(guild_id) {
            call.lock().await.stop();
        }
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> MusicResult<()> {
        self.tracks.remove(&guild_id);
        if self.songbird.get(guild_id).is_none() {
            return Ok(());
        }
        self.songbird
            .remove(guild_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;
        info!("Left voice in guild {}", guild_id);
        Ok(())
    }
}

/// Forwards the end or failure of one play to the manager.
#[derive(Clone)]
struct TrackNotifier {
    guild_id: GuildId,
    play_id: u64,
    events: UnboundedSender<EngineEvent>,
}

#[async_trait]
impl EventHandler for TrackNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let EventContext::Track(tracks) = ctx else {
            return None;
        };

        let failure = tracks.iter().find_map(|(state, _)| match &state.playing {
            PlayMode::Errored(e) => Some(format!("{:?}", e)),
            _ => None,
        });
        let event = match failure {
            Some(reason) => EngineEvent::Failed {
                guild_id: self.guild_id,
                play_id: self.play_id,
                reason,
            },
            None => EngineEvent::Finished {
                guild_id: self.guild_id,
                play_id: self.play_id,
            },
        };

        if self.events.send(event).is_err() {
            warn!("Playback event for guild {} dropped", self.guild_id);
        }
        None
    }
}

/// Reports voice connections that drop without us asking.
struct DisconnectNotifier {
    guild_id: GuildId,
    events: UnboundedSender<EngineEvent>,
}

#[async_trait]
impl EventHandler for DisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            if data.reason.is_some() {
                let event = EngineEvent::ConnectionLost {
                    guild_id: self.guild_id,
                };
                if self.events.send(event).is_err() {
                    warn!("Disconnect event for guild {} dropped", self.guild_id);
                }
            }
        }
        None
    }
}
