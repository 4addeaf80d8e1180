//! Nutcrack: a Discord bot with per-server music playback and AniList lookups.

pub mod commands;
pub mod config;
pub mod events;

#[cfg(feature = "music")]
use std::sync::Arc;

use commands::anilist::AniListClient;
#[cfg(feature = "music")]
use commands::music::utils::music_manager::MusicManager;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    #[cfg(feature = "music")]
    pub music: Arc<MusicManager>,
    pub anilist: AniListClient,
}
