use super::*;

/// Leave the voice channel and clear the queue
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .leave(&invocation)
        .await
        .map(|_| embedded_messages::left_voice_channel());

    respond(ctx, result).await
}
