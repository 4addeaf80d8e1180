use super::*;

/// Pause the current track
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .pause(&invocation)
        .await
        .map(|track| embedded_messages::paused(&track));

    respond(ctx, result).await
}
