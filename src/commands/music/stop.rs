use super::*;

/// Stop playback and clear the queue, staying in the channel
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .stop(&invocation)
        .await
        .map(|_| embedded_messages::stopped());

    respond(ctx, result).await
}
