//! Per-guild voice session and the transitions allowed on it.
//!
//! Nothing outside this module writes to a session's state; the music manager
//! calls these transitions and mirrors the result onto the playback engine.

use poise::serenity_prelude::{ChannelId, GuildId};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::music_manager::{MusicError, MusicResult};
use super::playback_engine::TrackMetadata;

/// Where a guild's voice session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No voice connection.
    Idle,
    /// Connected, nothing sounding.
    ConnectedEmpty,
    Playing,
    Paused,
}

/// One playable item with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Assigned at enqueue time, unique within a session.
    pub id: u64,
    pub name: String,
    pub source_query: String,
    pub requested_by: String,
    pub url: Option<String>,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
}

impl Track {
    pub fn new(
        metadata: TrackMetadata,
        source_query: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: metadata.title,
            source_query: source_query.into(),
            requested_by: requested_by.into(),
            url: metadata.url,
            duration: metadata.duration,
            thumbnail: metadata.thumbnail,
        }
    }
}

/// Result of [`VoiceSession::play`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayTransition {
    /// The head of the queue started sounding.
    Started(Track),
    /// Something is already playing or paused; the queue was left alone.
    AlreadyActive,
}

/// Result of [`VoiceSession::skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipOutcome {
    pub skipped: Option<Track>,
    pub next: Option<Track>,
}

/// A read-only copy of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub now_playing: Option<Track>,
    pub upcoming: Vec<Track>,
    pub looping: bool,
}

#[derive(Debug)]
pub struct VoiceSession {
    guild_id: GuildId,
    state: SessionState,
    queue: VecDeque<Track>,
    now_playing: Option<Track>,
    loop_current: bool,
    last_activity: Instant,
    voice_channel: Option<ChannelId>,
    text_channel: Option<ChannelId>,
    next_track_id: u64,
    play_id: u64,
    retired: bool,
    idle_check: Option<JoinHandle<()>>,
}

impl VoiceSession {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            state: SessionState::Idle,
            queue: VecDeque::new(),
            now_playing: None,
            loop_current: false,
            last_activity: Instant::now(),
            voice_channel: None,
            text_channel: None,
            next_track_id: 1,
            play_id: 0,
            retired: false,
            idle_check: None,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Idle
    }

    /// A retired session has been torn down and dropped from the store.
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn queue(&self) -> &VecDeque<Track> {
        &self.queue
    }

    pub fn now_playing(&self) -> Option<&Track> {
        self.now_playing.as_ref()
    }

    pub fn is_looping(&self) -> bool {
        self.loop_current
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.voice_channel
    }

    /// Channel of the last command, used for unsolicited notices.
    pub fn text_channel(&self) -> Option<ChannelId> {
        self.text_channel
    }

    pub fn set_text_channel(&mut self, channel_id: ChannelId) {
        self.text_channel = Some(channel_id);
    }

    /// Identifier of the most recent track start.
    pub fn play_id(&self) -> u64 {
        self.play_id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            now_playing: self.now_playing.clone(),
            upcoming: self.queue.iter().cloned().collect(),
            looping: self.loop_current,
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn start(&mut self, track: Track) -> Track {
        self.play_id += 1;
        self.state = SessionState::Playing;
        self.now_playing = Some(track.clone());
        self.touch();
        track
    }

    fn go_quiet(&mut self) {
        self.now_playing = None;
        self.loop_current = false;
        self.state = SessionState::ConnectedEmpty;
        self.touch();
    }

    /// Idle -> ConnectedEmpty. `user_channel` is the caller's voice channel.
    pub fn connect(&mut self, user_channel: Option<ChannelId>) -> MusicResult<()> {
        if self.is_connected() {
            return Err(MusicError::AlreadyConnected);
        }
        let channel_id = user_channel.ok_or(MusicError::NotInVoice)?;

        self.voice_channel = Some(channel_id);
        self.state = SessionState::ConnectedEmpty;
        self.touch();
        Ok(())
    }

    /// Append to the queue. Never starts playback on its own.
    pub fn enqueue(&mut self, mut track: Track) -> Track {
        track.id = self.next_track_id;
        self.next_track_id += 1;
        self.queue.push_back(track.clone());
        self.touch();
        track
    }

    /// ConnectedEmpty -> Playing with the head of the queue.
    pub fn play(&mut self) -> MusicResult<PlayTransition> {
        match self.state {
            SessionState::Idle => Err(MusicError::NotConnected),
            SessionState::Playing | SessionState::Paused => Ok(PlayTransition::AlreadyActive),
            SessionState::ConnectedEmpty => {
                let track = self.queue.pop_front().ok_or(MusicError::QueueEmpty)?;
                Ok(PlayTransition::Started(self.start(track)))
            }
        }
    }

    /// Playing -> Paused.
    pub fn pause(&mut self) -> MusicResult<Track> {
        if self.state != SessionState::Playing {
            return Err(MusicError::NothingPlaying);
        }
        self.state = SessionState::Paused;
        self.touch();
        self.now_playing.clone().ok_or(MusicError::NothingPlaying)
    }

    /// Paused -> Playing.
    pub fn resume(&mut self) -> MusicResult<Track> {
        if self.state != SessionState::Paused {
            return Err(MusicError::NotPaused);
        }
        self.state = SessionState::Playing;
        self.touch();
        self.now_playing.clone().ok_or(MusicError::NothingPlaying)
    }

    /// Drop the current track and start the next queued one, paused or not.
    pub fn skip(&mut self) -> MusicResult<SkipOutcome> {
        if !self.is_connected() {
            return Err(MusicError::NotConnected);
        }
        if self.now_playing.is_none() && self.queue.is_empty() {
            return Err(MusicError::QueueEmpty);
        }

        let skipped = self.now_playing.take();
        self.loop_current = false;
        let next = match self.queue.pop_front() {
            Some(track) => Some(self.start(track)),
            None => {
                self.go_quiet();
                None
            }
        };

        Ok(SkipOutcome { skipped, next })
    }

    /// Playing/Paused -> ConnectedEmpty, clearing the queue.
    pub fn stop(&mut self) -> MusicResult<()> {
        if !self.is_connected() {
            return Err(MusicError::NotConnected);
        }
        self.queue.clear();
        self.go_quiet();
        Ok(())
    }

    /// Flip the loop flag of the current track and return its new value.
    pub fn toggle_loop(&mut self) -> MusicResult<(Track, bool)> {
        let track = match self.state {
            SessionState::Playing | SessionState::Paused => {
                self.now_playing.clone().ok_or(MusicError::NothingPlaying)?
            }
            _ => return Err(MusicError::NothingPlaying),
        };
        self.loop_current = !self.loop_current;
        self.touch();
        Ok((track, self.loop_current))
    }

    /// Remove the queued track at 0-based `index`; later entries shift up.
    ///
    /// Failures report the 1-based position shown in the queue listing.
    pub fn remove_from_queue(&mut self, index: usize) -> MusicResult<Track> {
        let len = self.queue.len();
        let track = self
            .queue
            .remove(index)
            .ok_or(MusicError::IndexOutOfRange {
                position: index + 1,
                len,
            })?;
        self.touch();
        Ok(track)
    }

    /// Natural end of the current track.
    ///
    /// A looping track goes back to the head of the queue. Returns the track
    /// that starts next, or `None` when the session fell quiet.
    pub fn finish_current(&mut self) -> MusicResult<Option<Track>> {
        if self.state != SessionState::Playing {
            return Err(MusicError::NothingPlaying);
        }
        let finished = self.now_playing.take().ok_or(MusicError::NothingPlaying)?;
        if self.loop_current {
            self.queue.push_front(finished);
        }

        match self.queue.pop_front() {
            Some(track) => Ok(Some(self.start(track))),
            None => {
                self.go_quiet();
                Ok(None)
            }
        }
    }

    /// Any state -> Idle. The session is finished after this.
    pub fn disconnect(&mut self) {
        self.queue.clear();
        self.now_playing = None;
        self.loop_current = false;
        self.voice_channel = None;
        self.state = SessionState::Idle;
        self.retired = true;
        if let Some(check) = self.idle_check.take() {
            check.abort();
        }
    }

    /// Install a pending idle check, aborting the one it supersedes.
    pub fn replace_idle_check(&mut self, check: JoinHandle<()>) {
        if let Some(previous) = self.idle_check.replace(check) {
            previous.abort();
        }
    }

    /// Forget the pending idle check without aborting it. Called by the check
    /// itself once it fires.
    pub fn release_idle_check(&mut self) {
        self.idle_check = None;
    }

    pub fn has_pending_idle_check(&self) -> bool {
        self.idle_check.is_some()
    }
}
