//! Test fixtures for the Nutcrack Discord bot
//! This module contains sample ids and invocations used in tests

use nutcrack::commands::music::utils::music_manager::Invocation;
use nutcrack::config::IdleTimeouts;
use poise::serenity_prelude::{ChannelId, GuildId};
use std::time::Duration;

pub const GUILD: GuildId = GuildId::new(111_111);
pub const TEXT_CHANNEL: ChannelId = ChannelId::new(222_222);
pub const VOICE_CHANNEL: ChannelId = ChannelId::new(333_333);

/// The stock idle delays: five minutes after playback, three after queue commands.
pub fn timeouts() -> IdleTimeouts {
    IdleTimeouts {
        playback: Duration::from_secs(300),
        queue: Duration::from_secs(180),
    }
}

/// A user in `guild`, sitting in voice when `in_voice` is set.
pub fn invocation_in(guild_id: GuildId, in_voice: bool) -> Invocation {
    Invocation {
        guild_id,
        text_channel: TEXT_CHANNEL,
        user_channel: in_voice.then_some(VOICE_CHANNEL),
        user_name: "tester".to_string(),
    }
}

pub fn listener() -> Invocation {
    invocation_in(GUILD, true)
}
