use super::*;

/// Toggle looping of the current track
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    rename = "loop",
    category = "Music"
)]
pub async fn loop_track(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .toggle_loop(&invocation)
        .await
        .map(|(track, looping)| embedded_messages::loop_toggled(&track, looping));

    respond(ctx, result).await
}
