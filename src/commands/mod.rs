//! This module aggregates all the command modules for the bot.

/// Anime and manga lookups on AniList.
pub mod anilist;

/// Commands related to music playback (requires the `music` feature).
#[cfg(feature = "music")]
pub mod music;
