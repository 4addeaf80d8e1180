use poise::serenity_prelude::{ChannelId, GuildId};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::IdleTimeouts;

use super::announcer::{Announcer, Notice};
use super::playback_engine::{EngineEvent, PlaybackEngine};
use super::session::{
    PlayTransition, SessionSnapshot, SessionState, SkipOutcome, Track, VoiceSession,
};
use super::session_store::SessionStore;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("User is not in a voice channel")]
    NotInVoice,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Already connected to a voice channel")]
    AlreadyConnected,

    #[error("The queue is empty")]
    QueueEmpty,

    #[error("No track is currently playing")]
    NothingPlaying,

    #[error("The track is not paused")]
    NotPaused,

    #[error("Position {position} is outside a queue of {len} tracks")]
    IndexOutOfRange { position: usize, len: usize },

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Could not find a track for that query: {0}")]
    TrackLookup(String),

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Who asked for a music command, and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub guild_id: GuildId,
    /// Text channel the command came from.
    pub text_channel: ChannelId,
    /// Voice channel the caller sits in, if any.
    pub user_channel: Option<ChannelId>,
    pub user_name: String,
}

impl Invocation {
    fn require_voice(&self) -> MusicResult<ChannelId> {
        self.user_channel.ok_or(MusicError::NotInVoice)
    }
}

/// What `play` did with the requested track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    NowPlaying(Track),
    Queued { track: Track, position: usize },
}

/// Owns every guild's voice session and drives the playback engine.
pub struct MusicManager {
    store: SessionStore,
    engine: Arc<dyn PlaybackEngine>,
    announcer: Arc<dyn Announcer>,
    timeouts: IdleTimeouts,
}

impl MusicManager {
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        announcer: Arc<dyn Announcer>,
        timeouts: IdleTimeouts,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: SessionStore::new(),
            engine,
            announcer,
            timeouts,
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Spawn the task that feeds engine events back into the sessions.
    pub fn listen(self: Arc<Self>, mut events: UnboundedReceiver<EngineEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.handle_event(event).await;
            }
            info!("Playback event channel closed");
        })
    }

    /// Lock the guild's session, creating an Idle one if there is none.
    async fn lock_or_create(&self, guild_id: GuildId) -> OwnedMutexGuard<VoiceSession> {
        loop {
            let session = self.store.get_or_create(guild_id).lock_owned().await;
            if !session.is_retired() {
                return session;
            }
            // Torn down while we waited; look the guild up again.
        }
    }

    /// Lock the guild's session, failing unless the bot is in voice there.
    async fn connected_session(
        &self,
        guild_id: GuildId,
    ) -> MusicResult<OwnedMutexGuard<VoiceSession>> {
        let shared = self.store.get(guild_id).ok_or(MusicError::NotConnected)?;
        let session = shared.lock_owned().await;
        if session.is_retired() || !session.is_connected() {
            return Err(MusicError::NotConnected);
        }
        Ok(session)
    }

    async fn connect(&self, session: &mut VoiceSession, channel_id: ChannelId) -> MusicResult<()> {
        let guild_id = session.guild_id();
        if let Err(err) = self.engine.connect(guild_id, channel_id).await {
            error!("Failed to join channel {} in guild {}: {}", channel_id, guild_id, err);
            // A failed join can still leave a voice call behind.
            self.teardown(session).await;
            return Err(err);
        }
        session.connect(Some(channel_id))?;
        info!("Joined channel {} in guild {}", channel_id, guild_id);
        Ok(())
    }

    /// Leave voice and drop the session from the store.
    async fn teardown(&self, session: &mut VoiceSession) {
        let guild_id = session.guild_id();
        if let Err(e) = self.engine.disconnect(guild_id).await {
            warn!("Failed to leave voice in guild {}: {}", guild_id, e);
        }
        self.store.remove(guild_id);
        session.disconnect();
        info!("Closed voice session for guild {}", guild_id);
    }

    /// Run an engine call for a session; an engine failure closes the session.
    async fn drive<F>(&self, session: &mut VoiceSession, call: F) -> MusicResult<()>
    where
        F: Future<Output = MusicResult<()>>,
    {
        if let Err(err) = call.await {
            error!("Playback engine failed in guild {}: {}", session.guild_id(), err);
            self.teardown(session).await;
            return Err(err);
        }
        Ok(())
    }

    async fn start_track(&self, session: &mut VoiceSession, track: &Track) -> MusicResult<()> {
        let guild_id = session.guild_id();
        let play_id = session.play_id();
        info!("Starting '{}' in guild {} (play {})", track.name, guild_id, play_id);
        self.drive(session, self.engine.play(guild_id, track, play_id))
            .await
    }

    /// Replace the session's pending idle check with one firing after `delay`.
    fn schedule_idle_check(self: &Arc<Self>, session: &mut VoiceSession, delay: Duration) {
        let manager = Arc::clone(self);
        let guild_id = session.guild_id();
        let check = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.idle_check(guild_id).await;
        });
        session.replace_idle_check(check);
        debug!("Idle check for guild {} in {:?}", guild_id, delay);
    }

    async fn idle_check(&self, guild_id: GuildId) {
        let Some(shared) = self.store.get(guild_id) else {
            return;
        };
        let mut session = shared.lock_owned().await;
        session.release_idle_check();

        if session.is_retired() || session.state() == SessionState::Playing {
            debug!("Idle check for guild {}: still active", guild_id);
            return;
        }

        info!(
            "Leaving guild {} after {:?} without playback",
            guild_id,
            session.last_activity().elapsed()
        );
        let channel = session.text_channel();
        self.teardown(&mut session).await;
        if let Some(channel_id) = channel {
            self.announcer
                .announce(channel_id, Notice::IdleDisconnect)
                .await;
        }
    }

    /// Join the caller's voice channel without playing anything.
    pub async fn join(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<ChannelId> {
        let channel_id = invocation.require_voice()?;
        let mut session = self.lock_or_create(invocation.guild_id).await;
        if session.is_connected() {
            return Err(MusicError::AlreadyConnected);
        }

        session.set_text_channel(invocation.text_channel);
        self.connect(&mut session, channel_id).await?;
        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(channel_id)
    }

    pub async fn leave(&self, invocation: &Invocation) -> MusicResult<()> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;
        self.teardown(&mut session).await;
        Ok(())
    }

    /// Resolve `query`, joining the caller's channel first if needed, and
    /// either start it or queue it behind the current track.
    pub async fn play(
        self: &Arc<Self>,
        invocation: &Invocation,
        query: &str,
    ) -> MusicResult<PlayOutcome> {
        let channel_id = invocation.require_voice()?;
        let metadata = self.engine.resolve(query).await?;

        let mut session = self.lock_or_create(invocation.guild_id).await;
        session.set_text_channel(invocation.text_channel);
        if !session.is_connected() {
            self.connect(&mut session, channel_id).await?;
        }

        let track = session.enqueue(Track::new(metadata, query, &invocation.user_name));
        let outcome = match session.play()? {
            PlayTransition::Started(track) => {
                self.start_track(&mut session, &track).await?;
                PlayOutcome::NowPlaying(track)
            }
            PlayTransition::AlreadyActive => PlayOutcome::Queued {
                position: session.queue().len(),
                track,
            },
        };

        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(outcome)
    }

    pub async fn pause(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<Track> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        let track = session.pause()?;
        self.drive(&mut session, self.engine.pause(invocation.guild_id))
            .await?;
        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(track)
    }

    pub async fn resume(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<Track> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        let track = session.resume()?;
        self.drive(&mut session, self.engine.resume(invocation.guild_id))
            .await?;
        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(track)
    }

    pub async fn skip(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<SkipOutcome> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        let outcome = session.skip()?;
        match &outcome.next {
            Some(next) => self.start_track(&mut session, next).await?,
            None => {
                self.drive(&mut session, self.engine.stop(invocation.guild_id))
                    .await?
            }
        }
        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(outcome)
    }

    pub async fn stop(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<()> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        session.stop()?;
        self.drive(&mut session, self.engine.stop(invocation.guild_id))
            .await?;
        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(())
    }

    pub async fn toggle_loop(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<(Track, bool)> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        let toggled = session.toggle_loop()?;
        self.schedule_idle_check(&mut session, self.timeouts.playback);
        Ok(toggled)
    }

    /// Remove the queued track at 1-based `position`.
    pub async fn remove(self: &Arc<Self>, invocation: &Invocation, position: usize) -> MusicResult<Track> {
        let mut session = self.connected_session(invocation.guild_id).await?;

        let index = match position.checked_sub(1) {
            Some(index) => index,
            None => {
                return Err(MusicError::IndexOutOfRange {
                    position,
                    len: session.queue().len(),
                });
            }
        };
        let removed = session.remove_from_queue(index)?;
        self.schedule_idle_check(&mut session, self.timeouts.queue);
        Ok(removed)
    }

    /// The track currently sounding (or paused) with the session around it.
    pub async fn now_playing(&self, invocation: &Invocation) -> MusicResult<(Track, SessionSnapshot)> {
        let session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        let snapshot = session.snapshot();
        let track = snapshot.now_playing.clone().ok_or(MusicError::NothingPlaying)?;
        Ok((track, snapshot))
    }

    pub async fn queue(self: &Arc<Self>, invocation: &Invocation) -> MusicResult<SessionSnapshot> {
        let mut session = self.connected_session(invocation.guild_id).await?;
        invocation.require_voice()?;

        let snapshot = session.snapshot();
        self.schedule_idle_check(&mut session, self.timeouts.queue);
        Ok(snapshot)
    }

    /// Apply an engine event to its guild's session.
    pub async fn handle_event(self: &Arc<Self>, event: EngineEvent) {
        let guild_id = event.guild_id();
        let Some(shared) = self.store.get(guild_id) else {
            debug!("Dropping {:?}: no session", event);
            return;
        };
        let mut session = shared.lock_owned().await;
        if session.is_retired() {
            debug!("Dropping {:?}: session closed", event);
            return;
        }

        match event {
            EngineEvent::Finished { play_id, .. } => {
                if play_id != session.play_id() {
                    debug!("Ignoring end of superseded play {} in guild {}", play_id, guild_id);
                    return;
                }
                self.advance(&mut session).await;
            }
            EngineEvent::Failed { play_id, reason, .. } => {
                let sounding = matches!(
                    session.state(),
                    SessionState::Playing | SessionState::Paused
                );
                if play_id != session.play_id() || !sounding {
                    debug!("Ignoring failure of superseded play {} in guild {}", play_id, guild_id);
                    return;
                }
                error!("Track failed in guild {}: {}", guild_id, reason);
                self.close_with_notice(&mut session, Notice::PlaybackFailed { reason })
                    .await;
            }
            EngineEvent::ConnectionLost { .. } => {
                warn!("Voice connection lost in guild {}", guild_id);
                self.close_with_notice(&mut session, Notice::ConnectionLost)
                    .await;
            }
        }
    }

    /// Natural completion: replay, move on, or fall quiet.
    async fn advance(self: &Arc<Self>, session: &mut VoiceSession) {
        match session.finish_current() {
            Ok(Some(next)) => {
                let channel = session.text_channel();
                if let Err(err) = self.start_track(session, &next).await {
                    if let Some(channel_id) = channel {
                        let notice = Notice::PlaybackFailed {
                            reason: err.to_string(),
                        };
                        self.announcer.announce(channel_id, notice).await;
                    }
                }
            }
            Ok(None) => {
                debug!("Queue drained in guild {}", session.guild_id());
                self.schedule_idle_check(session, self.timeouts.playback);
            }
            Err(err) => debug!("Ignoring track end in guild {}: {}", session.guild_id(), err),
        }
    }

    async fn close_with_notice(&self, session: &mut VoiceSession, notice: Notice) {
        let channel = session.text_channel();
        self.teardown(session).await;
        if let Some(channel_id) = channel {
            self.announcer.announce(channel_id, notice).await;
        }
    }
}
