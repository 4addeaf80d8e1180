use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use poise::serenity_prelude::{ChannelId, CreateMessage, Http};
use std::sync::Arc;
use tracing::warn;

use super::embedded_messages;

/// Things the bot says without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Left the voice channel because nothing was playing.
    IdleDisconnect,
    /// Playback hit an unrecoverable error and the session was closed.
    PlaybackFailed { reason: String },
    /// The voice connection was dropped from the outside.
    ConnectionLost,
}

/// Posts [`Notice`]s to a text channel.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, channel_id: ChannelId, notice: Notice);
}

/// Announcer that sends an embed through the Discord HTTP API.
pub struct ChannelAnnouncer {
    http: Arc<Http>,
}

impl ChannelAnnouncer {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Announcer for ChannelAnnouncer {
    async fn announce(&self, channel_id: ChannelId, notice: Notice) {
        let message = CreateMessage::new().embed(embedded_messages::notice(&notice));
        if let Err(e) = channel_id.send_message(&self.http, message).await {
            warn!("Failed to post {:?} to channel {}: {}", notice, channel_id, e);
        }
    }
}
