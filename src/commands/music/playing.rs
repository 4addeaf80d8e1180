use super::*;

/// Show the track that is playing right now
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn playing(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .now_playing(&invocation)
        .await
        .map(|(track, snapshot)| embedded_messages::currently_playing(&track, &snapshot));

    respond(ctx, result).await
}
