use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nutcrack::commands::anilist::{AniListClient, media::*};
use nutcrack::config::Config;
use nutcrack::{CommandResult, Context, Data, Error, events};

#[poise::command(slash_command, prefix_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nutcrack=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;
    info!(
        "Starting with prefix '{}', idle timeouts {:?}",
        config.prefix, config.idle_timeouts
    );

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    // Create a vector to hold our commands
    let mut commands = vec![
        // Default commands
        register(),
        help(),
        // AniList commands
        anime(),
        manga(),
    ];

    // Handle Music feature
    #[cfg(feature = "music")]
    {
        use nutcrack::commands::music::{
            join::*, leave::*, loop_track::*, pause::*, play::*, playing::*, queue::*,
            remove::*, resume::*, skip::*, stop::*,
        };

        // Add music commands
        commands.extend(vec![
            join(),
            leave(),
            play(),
            pause(),
            resume(),
            skip(),
            stop(),
            loop_track(),
            remove(),
            playing(),
            queue(),
        ]);
    }

    #[cfg(feature = "music")]
    let songbird = songbird::Songbird::serenity();
    #[cfg(feature = "music")]
    let voice = songbird.clone();

    // poise only takes static literals here; the prefixes live for the whole run.
    let additional_prefixes = config
        .additional_prefixes()
        .into_iter()
        .map(|prefix| poise::Prefix::Literal(Box::leak(prefix.into_boxed_str())))
        .collect();

    let idle_timeouts = config.idle_timeouts;
    let anilist_url = config.anilist_url.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                additional_prefixes,
                case_insensitive_commands: true,
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(events::on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let http = reqwest::Client::new();
                let anilist = AniListClient::new(http.clone(), anilist_url);

                #[cfg(feature = "music")]
                let music = {
                    use nutcrack::commands::music::utils::{
                        announcer::ChannelAnnouncer, music_manager::MusicManager,
                        songbird_engine::SongbirdEngine,
                    };
                    use std::sync::Arc;

                    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
                    let engine = SongbirdEngine::new(voice, http, events_tx);
                    let announcer = ChannelAnnouncer::new(ctx.http.clone());
                    let manager =
                        MusicManager::new(Arc::new(engine), Arc::new(announcer), idle_timeouts);
                    Arc::clone(&manager).listen(events_rx);
                    manager
                };

                Ok(Data {
                    #[cfg(feature = "music")]
                    music,
                    anilist,
                })
            })
        });

    let client_builder =
        ClientBuilder::new(&config.discord_token, intents).framework(framework.build());

    // Create and run client
    #[cfg(feature = "music")]
    {
        use songbird::SerenityInit;

        let mut client = client_builder.register_songbird_with(songbird).await?;
        client.start().await.map_err(Into::into)
    }

    #[cfg(not(feature = "music"))]
    {
        let mut client = client_builder.await?;
        client.start().await.map_err(Into::into)
    }
}
