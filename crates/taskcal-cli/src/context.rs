//! Shared setup for commands: configuration, calendar client, clock.

use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use taskcal_core::config::default_config_path;
use taskcal_core::{credentials, CalendarError, Config, GoogleCalendarClient, HistoryStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn config_path(explicit: Option<&Path>) -> CliResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(default_config_path()?),
    }
}

pub fn load_config(explicit: Option<&Path>) -> CliResult<Config> {
    let path = config_path(explicit)?;
    tracing::debug!(path = %path.display(), "loading configuration");
    Ok(Config::load(&path)?)
}

pub fn history_store(config: &Config) -> HistoryStore {
    HistoryStore::new(config.history_dir())
}

/// Google client authorized with the stored access token.
pub fn google_client(config: &Config) -> CliResult<GoogleCalendarClient> {
    let token = credentials::access_token()?.ok_or(CalendarError::MissingToken)?;
    Ok(GoogleCalendarClient::new(&config.calendar_id, &token, config.time_zone)?)
}

/// Wall-clock time in the calendar's zone.
pub fn now(config: &Config) -> NaiveDateTime {
    Utc::now().with_timezone(&config.time_zone).naive_local()
}
