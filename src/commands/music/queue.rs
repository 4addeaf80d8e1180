use super::*;

/// View the current music queue
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let invocation = invocation(ctx)?;
    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    let result = ctx
        .data()
        .music
        .queue(&invocation)
        .await
        .map(|snapshot| embedded_messages::music_queue(&guild_name, &snapshot));

    respond(ctx, result).await
}
