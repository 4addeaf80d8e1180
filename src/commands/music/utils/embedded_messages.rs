use chrono::Utc;
use poise::serenity_prelude::{ChannelId, CreateEmbed, CreateEmbedFooter, Mentionable};
use std::time::Duration;

use super::announcer::Notice;
use super::format_duration;
use super::music_manager::MusicError;
use super::session::{SessionSnapshot, SessionState, SkipOutcome, Track};

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;
const QUEUE: u32 = 0x00ffff;

/// Room left for queue entries under Discord's 4096 character description cap,
/// after the overflow and total duration lines.
const QUEUE_LISTING_LIMIT: usize = 3900;

/// Track name as a markdown link when we know where it came from
fn track_link(track: &Track) -> String {
    match &track.url {
        Some(url) => format!("[{}]({})", track.name, url),
        None => format!("`{}`", track.name),
    }
}

fn duration_field(track: &Track) -> String {
    track
        .duration
        .map(|d| format!("`{}`", format_duration(d)))
        .unwrap_or_else(|| "`Unknown duration`".to_string())
}

fn with_thumbnail(embed: CreateEmbed, track: &Track) -> CreateEmbed {
    match &track.thumbnail {
        Some(thumbnail) => embed.thumbnail(thumbnail),
        None => embed,
    }
}

/// Create an embed for a music error, addressed to the invoking user
pub fn music_error(err: &MusicError, author: &impl Mentionable) -> CreateEmbed {
    let description = match err {
        MusicError::NotInVoice => format!("{}, You are not in a VC!", author.mention()),
        MusicError::NotConnected => format!("{}, I'm not in a VC!", author.mention()),
        MusicError::AlreadyConnected => {
            format!("{}, I'm already in a VC!", author.mention())
        }
        MusicError::QueueEmpty => "There is nothing in the queue!".to_string(),
        MusicError::IndexOutOfRange { len, .. } => {
            format!("Invalid position. The queue has {} tracks", len)
        }
        other => other.to_string(),
    };

    CreateEmbed::new()
        .title("❌ Error")
        .description(description)
        .color(FAILURE)
}

pub fn joined(channel_id: ChannelId) -> CreateEmbed {
    CreateEmbed::new()
        .title("🔊 Joined")
        .description(format!("Joined {}", channel_id.mention()))
        .color(SUCCESS)
}

pub fn left_voice_channel() -> CreateEmbed {
    CreateEmbed::new()
        .title("👋 Left Voice Channel")
        .description("Left the VC!")
        .color(SUCCESS)
}

/// Create an embed for when a song starts playing right away
pub fn now_playing(track: &Track) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(format!("Now Playing: {}", track_link(track)))
        .field("Duration", duration_field(track), true)
        .color(SUCCESS);

    with_thumbnail(embed, track)
}

/// Create an embed for when a song is added behind the current one
pub fn added_to_queue(track: &Track, position: usize) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title("Song Added to Queue!")
        .description(format!("**{}** added!", track.name))
        .field("Duration", duration_field(track), true)
        .field("Position", format!("`#{}`", position), true)
        .footer(CreateEmbedFooter::new(format!(
            "Added by {}",
            track.requested_by
        )))
        .timestamp(Utc::now())
        .color(QUEUE);

    with_thumbnail(embed, track)
}

pub fn paused(track: &Track) -> CreateEmbed {
    CreateEmbed::new()
        .title("⏸️ Paused")
        .description(format!("Paused {}!", track_link(track)))
        .color(SUCCESS)
}

pub fn resumed(track: &Track) -> CreateEmbed {
    CreateEmbed::new()
        .title("▶️ Resumed")
        .description(format!("Resumed {}!", track_link(track)))
        .color(SUCCESS)
}

pub fn skipped(outcome: &SkipOutcome) -> CreateEmbed {
    let description = match &outcome.next {
        Some(next) => format!("Skipped! Now Playing {}!", track_link(next)),
        None => "Skipped! The queue is now empty.".to_string(),
    };

    CreateEmbed::new()
        .title("⏭️ Skipped")
        .description(description)
        .color(SUCCESS)
}

pub fn stopped() -> CreateEmbed {
    CreateEmbed::new()
        .title("⏹️ Stopped")
        .description("Music Stopped!")
        .color(SUCCESS)
}

pub fn loop_toggled(track: &Track, looping: bool) -> CreateEmbed {
    let (title, description) = if looping {
        ("🔂 Loop Enabled", format!("`{}` is now looping!", track.name))
    } else {
        (
            "➡️ Loop Disabled",
            format!("`{}` is not looping anymore!", track.name),
        )
    };

    CreateEmbed::new()
        .title(title)
        .description(description)
        .color(SUCCESS)
}

pub fn track_removed(track: &Track, position: usize) -> CreateEmbed {
    CreateEmbed::new()
        .title("🗑️ Track Removed")
        .description(format!(
            "Removed `{}` from the queue (position #{}).",
            track.name, position
        ))
        .color(SUCCESS)
}

/// Create an embed describing the track that is currently sounding
pub fn currently_playing(track: &Track, snapshot: &SessionSnapshot) -> CreateEmbed {
    let status = if snapshot.state == SessionState::Paused {
        "Paused"
    } else {
        "Playing"
    };

    let embed = CreateEmbed::new()
        .title("🎶 Currently Playing")
        .description(format!("Currently playing: {}", track_link(track)))
        .field("Duration", duration_field(track), true)
        .field("Status", status, true)
        .field("Looping", if snapshot.looping { "Yes" } else { "No" }, true)
        .field("Requested by", track.requested_by.clone(), true)
        .color(SUCCESS);

    with_thumbnail(embed, track)
}

/// Create an embed for the music queue
pub fn music_queue(guild_name: &str, snapshot: &SessionSnapshot) -> CreateEmbed {
    let mut description = String::new();

    match &snapshot.now_playing {
        Some(track) => {
            description.push_str("**🎵 Now Playing**\n");
            description.push_str(&track_link(track));
            if snapshot.looping {
                description.push_str(" 🔂");
            }
            description.push_str("\n\n");
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if snapshot.upcoming.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!(
            "**📋 Up Next - {} tracks**\n",
            snapshot.upcoming.len()
        ));
        for (index, track) in snapshot.upcoming.iter().enumerate() {
            let mut line = format!("{}. {}", index + 1, track_link(track));
            if let Some(duration) = track.duration {
                line.push_str(&format!(" `{}`", format_duration(duration)));
            }
            line.push('\n');

            if description.len() + line.len() > QUEUE_LISTING_LIMIT {
                let hidden = snapshot.upcoming.len() - index;
                description.push_str(&format!("…and {} more\n", hidden));
                break;
            }
            description.push_str(&line);
        }

        let total: Duration = snapshot.upcoming.iter().filter_map(|t| t.duration).sum();
        if total.as_secs() > 0 {
            description.push_str(&format!(
                "\n**⏱️ Total Duration:** `{}`",
                format_duration(total)
            ));
        }
    }

    CreateEmbed::new()
        .title(format!("Current Queue for {}", guild_name))
        .description(description)
        .timestamp(Utc::now())
        .color(QUEUE)
}

/// Create an embed for an unsolicited notice
pub fn notice(notice: &Notice) -> CreateEmbed {
    match notice {
        Notice::IdleDisconnect => CreateEmbed::new()
            .title("💤 Disconnected")
            .description("Left the VC due to inactivity!")
            .color(SUCCESS),
        Notice::PlaybackFailed { reason } => CreateEmbed::new()
            .title("❌ Playback Error")
            .description(format!("Playback stopped and I left the VC: {}", reason))
            .color(FAILURE),
        Notice::ConnectionLost => CreateEmbed::new()
            .title("❌ Disconnected")
            .description("Lost the voice connection, the queue was cleared.")
            .color(FAILURE),
    }
}
