pub mod join;
pub mod leave;
pub mod loop_track;
pub mod pause;
pub mod play;
pub mod playing;
pub mod queue;
pub mod remove;
pub mod resume;
pub mod skip;
pub mod stop;

pub mod utils;

use poise::CreateReply;
use poise::serenity_prelude::CreateEmbed;
use tracing::warn;

use crate::{CommandResult, Context};
use utils::embedded_messages;
use utils::music_manager::{Invocation, MusicError, MusicResult};

/// Describe who invoked a music command and which voice channel they sit in.
fn invocation(ctx: Context<'_>) -> MusicResult<Invocation> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    let author = ctx.author();
    let user_channel = ctx.guild().and_then(|guild| {
        guild
            .voice_states
            .get(&author.id)
            .and_then(|state| state.channel_id)
    });

    Ok(Invocation {
        guild_id,
        text_channel: ctx.channel_id(),
        user_channel,
        user_name: author.name.clone(),
    })
}

/// Reply with the command's embed, or with the error rendered for the caller.
async fn respond(ctx: Context<'_>, result: MusicResult<CreateEmbed>) -> CommandResult {
    let embed = match result {
        Ok(embed) => embed,
        Err(err) => {
            warn!(
                "Music command `{}` refused for {}: {}",
                ctx.command().name,
                ctx.author().name,
                err
            );
            embedded_messages::music_error(&err, &ctx.author().id)
        }
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
