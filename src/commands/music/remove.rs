use super::*;

/// Remove a track from the queue by its position
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position of the track to remove (1-based)"] position: usize,
) -> CommandResult {
    let invocation = invocation(ctx)?;
    let result = ctx
        .data()
        .music
        .remove(&invocation, position)
        .await
        .map(|track| embedded_messages::track_removed(&track, position));

    respond(ctx, result).await
}
