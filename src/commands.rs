use crate::booking::api::{ApiSession, create_http_client};
use crate::booking::orchestrator::{RunOutcome, run_booking};
use crate::booking::plan::{
    AttemptLimit, BookingPlan, BookingPolicy, DateSelection, Preferences, RetrySettings,
};
use crate::cli::Args;
use crate::config::{Config, mask_token};
use crate::constants::preferences::{DEFAULT_COURT, DEFAULT_TIME};
use crate::error::AppError;
use crate::scheduler::{DailySchedule, run_daily};
use crate::shutdown::Shutdown;
use chrono::{DateTime, FixedOffset};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Validates command line argument combinations.
///
/// Returns an error if incompatible or malformed arguments are used together.
pub fn validate_args(args: &Args) -> Result<(), AppError> {
    DateSelection::parse(args.date.as_deref())?;

    if args.courts.iter().any(|c| c.trim().is_empty()) {
        return Err(AppError::config_error("Court names must not be empty"));
    }

    if let Some(event_id) = &args.event_id
        && event_id.trim().is_empty()
    {
        return Err(AppError::config_error("Event id must not be empty"));
    }

    if let Some(url) = &args.new_base_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        return Err(AppError::config_error(format!(
            "Base URL '{url}' must start with http:// or https://"
        )));
    }

    Ok(())
}

/// Handles the --list-config command.
pub async fn handle_list_config_command() -> Result<(), AppError> {
    Config::display().await
}

/// Handles configuration update commands (--set-token, --clear-token, --set-base-url).
///
/// Starts from the saved file (or defaults when there is none) without env
/// overrides, so only what the user asked for ends up on disk.
pub async fn handle_config_update_command(args: &Args) -> Result<(), AppError> {
    update_config_file(args, &Config::get_config_path()).await?;
    println!("Config updated successfully!");
    Ok(())
}

/// Applies the config update flags to the file at `path`.
///
/// A missing file starts from defaults. A file that exists but cannot be
/// read or parsed is an error, never silently replaced.
pub async fn update_config_file(args: &Args, path: &str) -> Result<Config, AppError> {
    let mut config = if Path::new(path).exists() {
        Config::load_from_path(path).await?
    } else {
        Config::default()
    };

    if let Some(token) = &args.new_token {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::config_error("Token must not be empty"));
        }
        config.auth_token = Some(token.to_string());
        println!("Session token saved ({}).", mask_token(token));
    } else if args.clear_token {
        config.auth_token = None;
        println!("Session token cleared.");
    }

    if let Some(base_url) = &args.new_base_url {
        config.base_url = base_url.clone();
    }

    config.validate()?;
    config.save_to_path(path).await?;

    Ok(config)
}

/// Run settings before the target date is known.
///
/// Daily mode builds a fresh [`BookingPlan`] from this at every trigger so
/// "tomorrow" always means tomorrow relative to that run.
#[derive(Debug, Clone)]
pub struct PlanTemplate {
    pub date: DateSelection,
    pub event_id: String,
    pub preferences: Preferences,
    pub policy: BookingPolicy,
    pub retry: RetrySettings,
}

impl PlanTemplate {
    pub fn from_args(args: &Args, config: &Config) -> Result<Self, AppError> {
        let courts = if args.courts.is_empty() {
            vec![DEFAULT_COURT.to_string()]
        } else {
            args.courts.clone()
        };
        let times = if args.times.is_empty() {
            vec![DEFAULT_TIME.to_string()]
        } else {
            args.times.clone()
        };

        let mut retry = RetrySettings::default();
        if args.poll_forever {
            retry.limit = AttemptLimit::Unlimited;
        } else if let Some(max) = args.max_retries {
            if max < 1 {
                warn!("--max-retries {max} is below 1; making a single attempt");
            }
            retry.limit = AttemptLimit::bounded(u32::try_from(max.max(1)).unwrap_or(u32::MAX));
        }
        if let Some(seconds) = args.retry_delay {
            retry.retry_delay = seconds_to_duration("--retry-delay", seconds)?;
        }
        if let Some(seconds) = args.booking_gap {
            retry.booking_gap = seconds_to_duration("--booking-gap", seconds)?;
        }

        Ok(Self {
            date: DateSelection::parse(args.date.as_deref())?,
            event_id: args
                .event_id
                .clone()
                .unwrap_or_else(|| config.event_id.clone()),
            preferences: Preferences::new(courts, times)?,
            policy: BookingPolicy::from_book_all(args.book_all),
            retry,
        })
    }

    pub fn plan_for(&self, now: DateTime<FixedOffset>) -> BookingPlan {
        BookingPlan {
            date: self.date.resolve(now),
            event_id: self.event_id.clone(),
            preferences: self.preferences.clone(),
            policy: self.policy,
            retry: self.retry,
        }
    }
}

fn seconds_to_duration(flag: &str, seconds: f64) -> Result<Duration, AppError> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| AppError::config_error(format!("Invalid {flag} value {seconds}: {e}")))
}

fn describe_limit(limit: AttemptLimit) -> String {
    match limit {
        AttemptLimit::Bounded(max) => format!("up to {max} attempt(s)"),
        AttemptLimit::Unlimited => "until booked".to_string(),
    }
}

fn log_startup_banner(
    template: &PlanTemplate,
    session: &ApiSession,
    schedule: Option<&DailySchedule>,
    now: DateTime<FixedOffset>,
) {
    let date = match template.date {
        DateSelection::Fixed(date) => date.to_string(),
        DateSelection::Tomorrow => format!("tomorrow ({})", template.date.resolve(now)),
    };

    info!("Court booker {}", env!("CARGO_PKG_VERSION"));
    info!("Service:  {}", session.base_url);
    info!("Event:    {}", template.event_id);
    info!("Date:     {date}");
    info!("Courts:   {}", template.preferences.courts().join(", "));
    info!("Times:    {}", template.preferences.times().join(", "));
    info!("Policy:   {}", template.policy.describe());
    info!(
        "Retry:    {}, {:?} between attempts, {:?} before each booking",
        describe_limit(template.retry.limit),
        template.retry.retry_delay,
        template.retry.booking_gap
    );
    info!("Token:    {}", mask_token(&session.token));
    match schedule {
        Some(schedule) => info!("Mode:     {}", schedule.describe()),
        None => info!("Mode:     run once now"),
    }
}

/// Handles a booking run: immediately, or daily with --schedule-time.
///
/// Exhausting the attempt limit is a normal outcome and returns `Ok`; only
/// configuration problems are errors.
pub async fn handle_booking_command(
    args: &Args,
    config: &Config,
    shutdown: Shutdown,
) -> Result<(), AppError> {
    let token = config.resolve_token(args.token.as_deref())?;
    let offset = config.schedule_offset()?;
    let template = PlanTemplate::from_args(args, config)?;
    let session = ApiSession::from_config(config, token);
    let client = create_http_client()?;

    let schedule = args
        .schedule_time
        .as_deref()
        .map(|time| DailySchedule::parse(time, offset))
        .transpose()?;

    let now = chrono::Utc::now().with_timezone(&offset);
    log_startup_banner(&template, &session, schedule.as_ref(), now);

    match schedule {
        Some(schedule) => {
            let client = &client;
            let session = &session;
            let template = &template;
            let run_shutdown = shutdown.clone();
            let runs = run_daily(schedule, shutdown, move |trigger_time| {
                let plan = template.plan_for(trigger_time);
                let shutdown = run_shutdown.clone();
                async move {
                    run_booking(client, session, &plan, shutdown).await;
                    Ok(())
                }
            })
            .await?;
            info!("Daily mode stopped after {runs} run(s)");
        }
        None => {
            let plan = template.plan_for(now);
            info!("--- Booking started ({}) ---", now.format("%Y-%m-%d %H:%M:%S %:z"));
            let summary = run_booking(&client, &session, &plan, shutdown).await;
            info!(
                "--- Booking finished ({}): {} with {} booking(s) ---",
                chrono::Utc::now()
                    .with_timezone(&offset)
                    .format("%Y-%m-%d %H:%M:%S %:z"),
                summary.outcome.label(),
                summary.total_booked
            );
            if summary.outcome == RunOutcome::Exhausted {
                warn!("No slot was booked; try again later or widen the preferences");
            }
        }
    }

    Ok(())
}
