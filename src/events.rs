use poise::serenity_prelude::{self as serenity, ActivityData, OnlineStatus};
use tracing::{error, info};

use crate::{Data, Error};

/// Handle gateway events the commands don't cover.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    _data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        info!(
            "{} is connected to {} guilds",
            data_about_bot.user.name,
            data_about_bot.guilds.len()
        );
        ctx.set_presence(
            Some(ActivityData::playing("with discord")),
            OnlineStatus::DoNotDisturb,
        );
    }
    Ok(())
}

/// Log framework errors, then let poise reply to the user.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match &error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to set up the framework: {}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {}", ctx.command().qualified_name, error);
        }
        _ => {}
    }

    if let Err(e) = poise::builtins::on_error(error).await {
        error!("Error while handling error: {}", e);
    }
}
