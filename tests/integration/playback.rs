use assert_matches::assert_matches;
use nutcrack::commands::music::utils::announcer::Notice;
use nutcrack::commands::music::utils::music_manager::{MusicError, MusicManager, PlayOutcome};
use nutcrack::commands::music::utils::playback_engine::EngineEvent;
use nutcrack::commands::music::utils::session::{SessionSnapshot, SessionState};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use crate::common::fixtures::{GUILD, TEXT_CHANNEL, VOICE_CHANNEL, listener, timeouts};
use crate::common::mocks::{EngineCall, MISSING, RecordingAnnouncer, RecordingEngine};
use crate::common::init;

struct Harness {
    manager: Arc<MusicManager>,
    engine: Arc<RecordingEngine>,
    announcer: Arc<RecordingAnnouncer>,
}

fn harness() -> Harness {
    init();
    let engine = Arc::new(RecordingEngine::default());
    let announcer = Arc::new(RecordingAnnouncer::default());
    let manager = MusicManager::new(engine.clone(), announcer.clone(), timeouts());
    Harness {
        manager,
        engine,
        announcer,
    }
}

impl Harness {
    async fn snapshot(&self) -> Option<SessionSnapshot> {
        let shared = self.manager.store().get(GUILD)?;
        let session = shared.lock().await;
        Some(session.snapshot())
    }

    async fn play_id(&self) -> u64 {
        match self.manager.store().get(GUILD) {
            Some(shared) => shared.lock().await.play_id(),
            None => 0,
        }
    }
}

fn names(snapshot: &SessionSnapshot) -> Vec<&str> {
    snapshot.upcoming.iter().map(|t| t.name.as_str()).collect()
}

/// play, queue behind, skip, stop, then the idle check closes the session.
#[tokio::test(start_paused = true)]
async fn test_play_queue_skip_stop_then_idle_disconnect() {
    let h = harness();
    let user = listener();

    let outcome = h.manager.play(&user, "song-a").await.unwrap();
    assert_matches!(outcome, PlayOutcome::NowPlaying(ref t) if t.name == "song-a");
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::Playing);
    assert_eq!(snapshot.now_playing.unwrap().name, "song-a");

    let outcome = h.manager.play(&user, "song-b").await.unwrap();
    assert_matches!(
        outcome,
        PlayOutcome::Queued { ref track, position: 1 } if track.name == "song-b"
    );
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(names(&snapshot), vec!["song-b"]);
    assert_eq!(snapshot.now_playing.unwrap().name, "song-a");

    let skipped = h.manager.skip(&user).await.unwrap();
    assert_eq!(skipped.skipped.unwrap().name, "song-a");
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(snapshot.now_playing.unwrap().name, "song-b");
    assert!(snapshot.upcoming.is_empty());

    h.manager.stop(&user).await.unwrap();
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(snapshot.state, SessionState::ConnectedEmpty);
    assert!(snapshot.now_playing.is_none());

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert!(h.manager.store().is_empty());
    assert_eq!(
        h.announcer.notices(),
        vec![(TEXT_CHANNEL, Notice::IdleDisconnect)]
    );
    assert_eq!(
        h.engine.calls(),
        vec![
            EngineCall::Connect(GUILD, VOICE_CHANNEL),
            EngineCall::Play {
                name: "song-a".into(),
                play_id: 1
            },
            EngineCall::Play {
                name: "song-b".into(),
                play_id: 2
            },
            EngineCall::Stop,
            EngineCall::Disconnect(GUILD),
        ]
    );
}

#[tokio::test]
async fn test_pause_then_resume_restores_playing() {
    let h = harness();
    let user = listener();
    h.manager.play(&user, "a").await.unwrap();
    h.manager.play(&user, "b").await.unwrap();
    let before = h.snapshot().await.unwrap();

    assert_eq!(h.manager.pause(&user).await.unwrap().name, "a");
    assert_eq!(h.snapshot().await.unwrap().state, SessionState::Paused);
    assert_matches!(h.manager.pause(&user).await, Err(MusicError::NothingPlaying));

    assert_eq!(h.manager.resume(&user).await.unwrap().name, "a");
    assert_eq!(h.snapshot().await.unwrap(), before);
    assert_matches!(h.manager.resume(&user).await, Err(MusicError::NotPaused));
}

/// A looping track replays on natural completion until the loop is turned off.
#[tokio::test]
async fn test_loop_replays_until_disabled() {
    let h = harness();
    let user = listener();
    h.manager.play(&user, "a").await.unwrap();
    h.manager.play(&user, "b").await.unwrap();

    let (track, looping) = h.manager.toggle_loop(&user).await.unwrap();
    assert_eq!(track.name, "a");
    assert!(looping);

    h.manager
        .handle_event(EngineEvent::Finished {
            guild_id: GUILD,
            play_id: h.play_id().await,
        })
        .await;
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(snapshot.now_playing.as_ref().unwrap().name, "a");
    assert_eq!(names(&snapshot), vec!["b"]);

    let (_, looping) = h.manager.toggle_loop(&user).await.unwrap();
    assert!(!looping);
    h.manager
        .handle_event(EngineEvent::Finished {
            guild_id: GUILD,
            play_id: h.play_id().await,
        })
        .await;
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(snapshot.now_playing.unwrap().name, "b");
    assert!(snapshot.upcoming.is_empty());
}

/// Once the queue drains the playback idle check takes the bot out of voice.
#[tokio::test(start_paused = true)]
async fn test_natural_end_of_queue_goes_quiet_then_leaves() {
    let h = harness();
    h.manager.play(&listener(), "only").await.unwrap();

    tokio::time::sleep(Duration::from_secs(200)).await;
    h.manager
        .handle_event(EngineEvent::Finished {
            guild_id: GUILD,
            play_id: h.play_id().await,
        })
        .await;
    assert_eq!(
        h.snapshot().await.unwrap().state,
        SessionState::ConnectedEmpty
    );

    // The check scheduled by play would have fired at 300s.
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert!(h.snapshot().await.is_some());

    tokio::time::sleep(Duration::from_secs(200)).await;
    assert!(h.snapshot().await.is_none());
}

/// Queue commands use the shorter idle delay.
#[tokio::test(start_paused = true)]
async fn test_queue_view_uses_queue_timeout() {
    let h = harness();
    let user = listener();
    h.manager.join(&user).await.unwrap();
    let snapshot = h.manager.queue(&user).await.unwrap();
    assert_eq!(snapshot.state, SessionState::ConnectedEmpty);

    tokio::time::sleep(Duration::from_secs(181)).await;
    assert!(h.manager.store().is_empty());
}

/// Events from the engine reach the session through the listener task.
#[tokio::test(start_paused = true)]
async fn test_listener_applies_engine_events() {
    let h = harness();
    let (events, receiver) = tokio::sync::mpsc::unbounded_channel();
    let listener_task = Arc::clone(&h.manager).listen(receiver);

    let user = listener();
    h.manager.play(&user, "a").await.unwrap();
    h.manager.play(&user, "b").await.unwrap();

    events
        .send(EngineEvent::Finished {
            guild_id: GUILD,
            play_id: h.play_id().await,
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.snapshot().await.unwrap().now_playing.unwrap().name, "b");

    events
        .send(EngineEvent::ConnectionLost { guild_id: GUILD })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(h.manager.store().is_empty());
    assert_eq!(
        h.announcer.notices(),
        vec![(TEXT_CHANNEL, Notice::ConnectionLost)]
    );

    drop(events);
    listener_task.await.unwrap();
}

/// Leaving closes the session; a later play starts a fresh one.
#[tokio::test]
async fn test_leave_then_play_again() {
    let h = harness();
    let user = listener();
    h.manager.play(&user, "a").await.unwrap();
    h.manager.play(&user, "b").await.unwrap();

    h.manager.leave(&user).await.unwrap();
    assert!(h.manager.store().is_empty());
    assert_matches!(h.manager.leave(&user).await, Err(MusicError::NotConnected));

    h.manager.play(&user, "c").await.unwrap();
    let snapshot = h.snapshot().await.unwrap();
    assert_eq!(snapshot.now_playing.unwrap().name, "c");
    assert!(snapshot.upcoming.is_empty());
    assert_eq!(
        h.engine.count(|c| matches!(c, EngineCall::Connect(..))),
        2
    );
}

/// A search miss is reported and leaves no trace.
#[tokio::test]
async fn test_unknown_track_does_not_join() {
    let h = harness();
    assert_matches!(
        h.manager.play(&listener(), MISSING).await,
        Err(MusicError::TrackLookup(_))
    );
    assert!(h.manager.store().is_empty());
    assert!(h.engine.calls().is_empty());
}
