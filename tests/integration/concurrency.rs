use nutcrack::commands::music::utils::music_manager::{MusicManager, PlayOutcome};
use nutcrack::commands::music::utils::session::SessionState;
use poise::serenity_prelude::GuildId;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use crate::common::fixtures::{GUILD, invocation_in, listener, timeouts};
use crate::common::init;
use crate::common::mocks::{EngineCall, RecordingAnnouncer, RecordingEngine};

fn manager(engine: &Arc<RecordingEngine>) -> Arc<MusicManager> {
    init();
    MusicManager::new(
        engine.clone(),
        Arc::new(RecordingAnnouncer::default()),
        timeouts(),
    )
}

/// Racing plays in one guild share a single session and a single join.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_plays_in_one_guild() {
    let engine = Arc::new(RecordingEngine::default());
    let manager = manager(&engine);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.play(&listener(), &format!("track-{}", i)).await })
        })
        .collect();

    let mut started = 0;
    let mut positions = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            PlayOutcome::NowPlaying(_) => started += 1,
            PlayOutcome::Queued { position, .. } => positions.push(position),
        }
    }
    positions.sort_unstable();

    assert_eq!(started, 1);
    assert_eq!(positions, (1..=9).collect::<Vec<_>>());
    assert_eq!(manager.store().len(), 1);
    assert_eq!(engine.count(|c| matches!(c, EngineCall::Connect(..))), 1);

    let shared = manager.store().get(GUILD).unwrap();
    let session = shared.lock().await;
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(session.queue().len(), 9);
}

/// Each guild gets its own session.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_guilds_are_independent() {
    let engine = Arc::new(RecordingEngine::default());
    let manager = manager(&engine);

    let handles: Vec<_> = (1..=8)
        .map(|id| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let user = invocation_in(GuildId::new(id), true);
                manager.play(&user, "anthem").await
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, PlayOutcome::NowPlaying(_)));
    }
    assert_eq!(manager.store().len(), 8);

    // Stopping one guild leaves the others playing.
    let first = invocation_in(GuildId::new(1), true);
    manager.stop(&first).await.unwrap();
    for id in 2..=8 {
        let shared = manager.store().get(GuildId::new(id)).unwrap();
        assert_eq!(shared.lock().await.state(), SessionState::Playing);
    }
}
