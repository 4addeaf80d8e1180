use super::*;

/// Skip to the next track in the queue
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .skip(&invocation)
        .await
        .map(|outcome| embedded_messages::skipped(&outcome));

    respond(ctx, result).await
}
