use super::*;

/// Resume the paused track
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .resume(&invocation)
        .await
        .map(|track| embedded_messages::resumed(&track));

    respond(ctx, result).await
}
