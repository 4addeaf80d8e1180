use super::*;

/// Join your voice channel
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn join(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .join(&invocation)
        .await
        .map(embedded_messages::joined);

    respond(ctx, result).await
}
