use poise::CreateReply;
use tracing::warn;

use crate::{CommandResult, Context};

use super::*;

/// Look up an anime on AniList
#[poise::command(prefix_command, slash_command, aliases("anilist"), category = "AniList")]
pub async fn anime(
    ctx: Context<'_>,
    #[description = "Name of the anime"]
    #[rest]
    name: String,
) -> CommandResult {
    lookup(ctx, MediaKind::Anime, &name).await
}

/// Look up a manga on AniList
#[poise::command(prefix_command, slash_command, category = "AniList")]
pub async fn manga(
    ctx: Context<'_>,
    #[description = "Name of the manga"]
    #[rest]
    name: String,
) -> CommandResult {
    lookup(ctx, MediaKind::Manga, &name).await
}

async fn lookup(ctx: Context<'_>, kind: MediaKind, name: &str) -> CommandResult {
    ctx.defer().await?;

    let embed = match ctx.data().anilist.search(kind, name).await {
        Ok(media) => media_embed(kind, &media),
        Err(err) => {
            warn!("AniList {} lookup for '{}' failed: {}", kind.noun(), name, err);
            lookup_failed(kind, name, &err)
        }
    };

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
