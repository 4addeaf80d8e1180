use super::*;
use tracing::info;
use utils::music_manager::PlayOutcome;

/// Play a song from YouTube or a direct URL
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let invocation = invocation(ctx)?;

    // Looking the track up can take a while
    ctx.defer().await?;

    let result = ctx
        .data()
        .music
        .play(&invocation, &query)
        .await
        .map(|outcome| match outcome {
            PlayOutcome::NowPlaying(track) => embedded_messages::now_playing(&track),
            PlayOutcome::Queued { track, position } => {
                embedded_messages::added_to_queue(&track, position)
            }
        });

    respond(ctx, result).await
}
