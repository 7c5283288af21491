use crate::constants::{self, env_vars};
use crate::error::AppError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_log_dir_path};
use validation::validate_config;

/// Persistent settings for talking to the reservation service.
///
/// Every field has a default, so a missing or partial config file is fine.
/// The session token is the only value without a usable default; it has to
/// come from the file, the environment or the command line.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the reservation service, scheme included.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Session token sent as the `token` cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Booking event (venue category) queried when none is given on the command line.
    #[serde(default = "default_event_id")]
    pub event_id: String,
    /// Path to the log file. If not specified, logs go to the default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
    #[serde(default = "default_booking_timeout")]
    pub booking_timeout_seconds: u64,
    /// Offset of the venue's wall clock, used for the daily trigger and the default date.
    #[serde(default = "default_schedule_offset")]
    pub schedule_utc_offset_hours: i32,
}

fn default_base_url() -> String {
    constants::DEFAULT_BASE_URL.to_string()
}

fn default_event_id() -> String {
    constants::DEFAULT_EVENT_ID.to_string()
}

fn default_query_timeout() -> u64 {
    constants::DEFAULT_QUERY_TIMEOUT_SECONDS
}

fn default_booking_timeout() -> u64 {
    constants::DEFAULT_BOOKING_TIMEOUT_SECONDS
}

fn default_schedule_offset() -> i32 {
    constants::DEFAULT_SCHEDULE_UTC_OFFSET_HOURS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            auth_token: None,
            event_id: default_event_id(),
            log_file_path: None,
            query_timeout_seconds: default_query_timeout(),
            booking_timeout_seconds: default_booking_timeout(),
            schedule_utc_offset_hours: default_schedule_offset(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    ///
    /// A missing file yields the defaults. Environment variables override
    /// file values:
    /// - `COURT_BOOKER_BASE_URL` - Override base URL
    /// - `COURT_BOOKER_TOKEN` - Session token
    /// - `COURT_BOOKER_EVENT_ID` - Override default event id
    /// - `COURT_BOOKER_LOG_FILE` - Override log file path
    /// - `COURT_BOOKER_HTTP_TIMEOUT` - Override both request timeouts in seconds
    pub async fn load() -> Result<Self, AppError> {
        Self::load_with_overrides(&get_config_path()).await
    }

    /// Same as [`Config::load`] but reading the file at `path`.
    pub async fn load_with_overrides(path: &str) -> Result<Self, AppError> {
        let mut config = if Path::new(path).exists() {
            Self::load_from_path(path).await?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a file path without env overrides or validation.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies `COURT_BOOKER_*` environment overrides. Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(base_url) = non_empty(env_vars::BASE_URL) {
            self.base_url = base_url;
        }

        if let Some(token) = non_empty(env_vars::TOKEN) {
            self.auth_token = Some(token);
        }

        if let Some(event_id) = non_empty(env_vars::EVENT_ID) {
            self.event_id = event_id;
        }

        if let Some(log_file_path) = non_empty(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }

        if let Some(timeout) = non_empty(env_vars::HTTP_TIMEOUT).and_then(|s| s.parse::<u64>().ok())
        {
            self.query_timeout_seconds = timeout;
            self.booking_timeout_seconds = timeout;
        }
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(
            &self.base_url,
            &self.event_id,
            &self.log_file_path,
            self.query_timeout_seconds,
            self.booking_timeout_seconds,
            self.schedule_utc_offset_hours,
        )
    }

    /// Picks the session token: command line first, then config/env.
    ///
    /// # Errors
    /// * `AppError::Config` - No non-empty token is available anywhere
    pub fn resolve_token(&self, cli_token: Option<&str>) -> Result<String, AppError> {
        cli_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.auth_token
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                AppError::config_error(format!(
                    "A session token is required: pass --token, set {} or run --set-token",
                    env_vars::TOKEN
                ))
            })
    }

    /// The venue's wall-clock offset as a chrono timezone.
    pub fn schedule_offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.schedule_utc_offset_hours * 3600).ok_or_else(|| {
            AppError::config_error(format!(
                "Invalid schedule UTC offset: {}",
                self.schedule_utc_offset_hours
            ))
        })
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    /// Saves configuration to a custom file path.
    ///
    /// Creates the parent directory if needed and strips trailing slashes
    /// from the base URL so endpoint paths can be appended verbatim.
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If there's an I/O error creating directories or writing the file
    /// * `AppError::TomlSerialize` - If there's an error serializing the configuration
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }

        let content = toml::to_string_pretty(&Config {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            ..self.clone()
        })?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();

        if Path::new(&config_path).exists() {
            let config = Config::load().await?;
            println!("\nCurrent Configuration");
            println!("────────────────────────────────────");
            println!("Config Location:");
            println!("{config_path}");
            println!("────────────────────────────────────");
            println!("Base URL:");
            println!("{}", config.base_url);
            println!("────────────────────────────────────");
            println!("Default Event ID:");
            println!("{}", config.event_id);
            println!("────────────────────────────────────");
            println!("Session Token:");
            match &config.auth_token {
                Some(token) => println!("{}", mask_token(token)),
                None => println!("(not set)"),
            }
            println!("────────────────────────────────────");
            println!("Timeouts:");
            println!(
                "query {}s, booking {}s",
                config.query_timeout_seconds, config.booking_timeout_seconds
            );
            println!("────────────────────────────────────");
            println!("Schedule Timezone:");
            println!("UTC{:+}", config.schedule_utc_offset_hours);
            println!("────────────────────────────────────");
            println!("Log File Location:");
            if let Some(custom_path) = &config.log_file_path {
                println!("{custom_path}");
            } else {
                println!("{log_dir}/court_booker.log");
                println!("(Default location)");
            }
        } else {
            println!("\nNo configuration file found at:");
            println!("{config_path}");
        }

        Ok(())
    }
}

/// Shortens a token for display so it never lands in logs in full.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}...{tail}")
}
