//! Startup configuration read from the environment.

use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PREFIX: &str = "n!";
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_QUEUE_IDLE_TIMEOUT: Duration = Duration::from_secs(180);
const DEFAULT_ANILIST_API: &str = "https://graphql.anilist.co";

/// Errors raised while reading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid duration for {key}: {source}")]
    InvalidDuration {
        key: &'static str,
        #[source]
        source: humantime::DurationError,
    },
}

/// Delays before a voice session is checked for inactivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleTimeouts {
    /// After playback commands.
    pub playback: Duration,
    /// After looking at or editing the queue.
    pub queue: Duration,
}

impl Default for IdleTimeouts {
    fn default() -> Self {
        Self {
            playback: DEFAULT_IDLE_TIMEOUT,
            queue: DEFAULT_QUEUE_IDLE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub prefix: String,
    pub idle_timeouts: IdleTimeouts,
    pub anilist_url: String,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .or_else(|| lookup("TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let duration = |key: &'static str, default: Duration| match lookup(key) {
            Some(raw) => humantime::parse_duration(raw.trim())
                .map_err(|source| ConfigError::InvalidDuration { key, source }),
            None => Ok(default),
        };

        Ok(Self {
            discord_token,
            prefix: lookup("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            idle_timeouts: IdleTimeouts {
                playback: duration("IDLE_TIMEOUT", DEFAULT_IDLE_TIMEOUT)?,
                queue: duration("QUEUE_IDLE_TIMEOUT", DEFAULT_QUEUE_IDLE_TIMEOUT)?,
            },
            anilist_url: lookup("ANILIST_API_URL")
                .unwrap_or_else(|| DEFAULT_ANILIST_API.to_string()),
        })
    }

    /// Other spellings of the prefix that are also accepted, such as `N!` for `n!`.
    pub fn additional_prefixes(&self) -> Vec<String> {
        let upper = self.prefix.to_uppercase();
        if upper == self.prefix {
            Vec::new()
        } else {
            vec![upper]
        }
    }
}
