//! Anime and manga lookups against the AniList GraphQL API.

use poise::serenity_prelude::{CreateEmbed, CreateEmbedFooter};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Submodule defining the `anime` and `manga` commands.
pub mod media;

const ANILIST_BLUE: u32 = 0x02a9ff;
const FAILURE: u32 = 0xff0000;
/// Discord's limit on the length of an embed field value.
const FIELD_LIMIT: usize = 1024;

const MEDIA_QUERY: &str = r#"
query ($name: String, $type: MediaType) {
  Media(search: $name, type: $type) {
    id
    idMal
    title { romaji english }
    coverImage { large }
    startDate { year month day }
    endDate { year month day }
    synonyms
    format
    status
    episodes
    duration
    chapters
    volumes
    nextAiringEpisode { episode }
    averageScore
    source
    genres
    tags { name }
    studios(isMain: true) { nodes { name } }
    siteUrl
  }
}
"#;

/// Which AniList catalogue to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Anime,
    Manga,
}

impl MediaKind {
    fn graphql_type(self) -> &'static str {
        match self {
            MediaKind::Anime => "ANIME",
            MediaKind::Manga => "MANGA",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            MediaKind::Anime => "anime",
            MediaKind::Manga => "manga",
        }
    }
}

/// Errors from the AniList API.
#[derive(Error, Debug)]
pub enum AniListError {
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    #[error("AniList answered with status {0}")]
    Status(StatusCode),

    #[error("Unable to parse AniList response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No matching media found")]
    NotFound,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<MediaData>,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(rename = "Media")]
    media: Option<Media>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: u64,
    pub id_mal: Option<u64>,
    pub title: MediaTitle,
    pub cover_image: Option<CoverImage>,
    #[serde(default)]
    pub start_date: FuzzyDate,
    #[serde(default)]
    pub end_date: FuzzyDate,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub format: Option<String>,
    pub status: Option<String>,
    pub episodes: Option<u32>,
    pub duration: Option<u32>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub next_airing_episode: Option<AiringEpisode>,
    pub average_score: Option<u32>,
    pub source: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub studios: Option<Studios>,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CoverImage {
    pub large: Option<String>,
}

/// A date where any part may be unknown.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FuzzyDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AiringEpisode {
    pub episode: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Studios {
    #[serde(default)]
    pub nodes: Vec<Studio>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Studio {
    pub name: String,
}

/// Client for the AniList GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct AniListClient {
    http: reqwest::Client,
    api_url: String,
}

impl AniListClient {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    /// Find the best match for `name` in the given catalogue.
    pub async fn search(&self, kind: MediaKind, name: &str) -> Result<Media, AniListError> {
        let body = json!({
            "query": MEDIA_QUERY,
            "variables": { "name": name, "type": kind.graphql_type() },
        });

        let response = self.http.post(&self.api_url).json(&body).send().await?;
        let status = response.status();
        debug!("AniList {} search for '{}': {}", kind.noun(), name, status);

        if status == StatusCode::NOT_FOUND {
            return Err(AniListError::NotFound);
        }
        if !status.is_success() {
            return Err(AniListError::Status(status));
        }

        let text = response.text().await?;
        let parsed: GraphQlResponse = serde_json::from_str(&text)?;
        parsed
            .data
            .and_then(|data| data.media)
            .ok_or(AniListError::NotFound)
    }
}

/// English title with the romaji one in parentheses when they differ.
fn display_title(title: &MediaTitle) -> String {
    let romaji = title.romaji.as_deref();
    match (title.english.as_deref(), romaji) {
        (Some(english), Some(romaji)) if english != romaji => format!("{} ({})", english, romaji),
        (_, Some(romaji)) => romaji.to_string(),
        (Some(english), None) => english.to_string(),
        (None, None) => "Unknown".to_string(),
    }
}

/// "d.m.yyyy", leaving out the parts AniList does not know.
fn format_date(date: &FuzzyDate) -> Option<String> {
    let parts: Vec<String> = [
        date.day.map(|d| d.to_string()),
        date.month.map(|m| m.to_string()),
        date.year.map(|y| y.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Turns an AniList enum value such as `TV_SHORT` into "TV Short".
fn humanize(value: &str) -> String {
    value
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| match word {
            "TV" | "OVA" | "ONA" => word.to_string(),
            _ => {
                let lower = word.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Comma-joins `items`, dropping the tail that would not fit in a field.
fn join_capped<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    const MORE: &str = ", …";
    let mut joined = String::new();
    for item in items {
        let sep = if joined.is_empty() { "" } else { ", " };
        let len = joined.chars().count() + sep.len() + item.chars().count();
        if len + MORE.chars().count() > FIELD_LIMIT {
            joined.push_str(if joined.is_empty() { "…" } else { MORE });
            break;
        }
        joined.push_str(sep);
        joined.push_str(item);
    }
    joined
}

/// Build the reply embed for a found anime or manga.
pub fn media_embed(kind: MediaKind, media: &Media) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .color(ANILIST_BLUE)
        .footer(CreateEmbedFooter::new(format!(
            "API provided by AniList.co | ID: {}",
            media.id
        )))
        .field("Title", display_title(&media.title), false);

    if let Some(cover) = media.cover_image.as_ref().and_then(|c| c.large.as_ref()) {
        embed = embed.thumbnail(cover);
    }

    match kind {
        MediaKind::Anime => {
            if !media.synonyms.is_empty() {
                embed = embed.field(
                    "Synonyms",
                    join_capped(media.synonyms.iter().map(String::as_str)),
                    true,
                );
            }
            if let Some(format) = &media.format {
                embed = embed.field("Format", humanize(format), true);
            }
            let minutes = media
                .duration
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".to_string());
            match media.episodes {
                Some(episodes) if episodes > 1 => {
                    embed = embed.field("Episodes", format!("{} x {} min", episodes, minutes), true);
                }
                _ => embed = embed.field("Duration", format!("{} min", minutes), true),
            }
        }
        MediaKind::Manga => {
            if let Some(chapters) = media.chapters {
                embed = embed.field("Chapters", chapters.to_string(), true);
            }
            if let Some(volumes) = media.volumes {
                embed = embed.field("Volumes", volumes.to_string(), true);
            }
        }
    }

    if let Some(started) = format_date(&media.start_date) {
        embed = embed.field("Started", started, true);
    }
    let ended = media.end_date.day.and(format_date(&media.end_date));
    match (kind, ended) {
        (MediaKind::Anime, None) => {
            if let Some(next) = &media.next_airing_episode {
                embed = embed.field(
                    "Released Episodes",
                    next.episode.saturating_sub(1).to_string(),
                    true,
                );
            }
        }
        (MediaKind::Anime, Some(ended)) if media.episodes.unwrap_or(0) > 1 => {
            embed = embed.field("Ended", ended, true);
        }
        (MediaKind::Manga, Some(ended)) => embed = embed.field("Ended", ended, true),
        _ => {}
    }

    if let Some(status) = &media.status {
        embed = embed.field("Status", humanize(status), true);
    }
    if kind == MediaKind::Anime {
        if let Some(studio) = media.studios.as_ref().and_then(|s| s.nodes.first()) {
            embed = embed.field("Main Studio", studio.name.clone(), true);
        }
    }
    let score = media
        .average_score
        .map(|s| format!("{}%", s))
        .unwrap_or_else(|| "-".to_string());
    embed = embed.field("Average Score", score, true);

    if !media.genres.is_empty() {
        let genres = join_capped(media.genres.iter().map(String::as_str));
        embed = embed.field("Genres", genres, false);
    }
    if !media.tags.is_empty() {
        let tags = join_capped(media.tags.iter().map(|t| t.name.as_str()));
        embed = embed.field("Tags", tags, false);
    }
    if kind == MediaKind::Anime {
        if let Some(source) = &media.source {
            embed = embed.field("Adapted From", humanize(source), true);
        }
    }

    if let Some(site_url) = &media.site_url {
        embed = embed.field("AniList Link", site_url.clone(), false);
    }
    if let Some(id_mal) = media.id_mal {
        embed = embed.field(
            "MyAnimeList Link",
            format!("https://myanimelist.net/{}/{}", kind.noun(), id_mal),
            false,
        );
    }

    embed
}

/// Build the reply embed for a failed lookup.
pub fn lookup_failed(kind: MediaKind, name: &str, err: &AniListError) -> CreateEmbed {
    let description = match err {
        AniListError::NotFound => format!("Could not find any {} named '{}'!", kind.noun(), name),
        _ => "AniList is unavailable right now, try again later.".to_string(),
    };

    CreateEmbed::new()
        .title("❌ Error")
        .description(description)
        .color(FAILURE)
}
