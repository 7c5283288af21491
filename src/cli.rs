use clap::Parser;
use clap::builder::styling::{AnsiColor, Effects, Styles};

use crate::booking::plan::validate_time_format;
use crate::constants::retry::MAX_WAIT_SECONDS;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

fn parse_hhmm(value: &str) -> Result<String, String> {
    validate_time_format(value).map_err(|e| e.to_string())
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(format!("'{value}' must be zero or a positive number of seconds"));
    }
    if seconds > MAX_WAIT_SECONDS {
        return Err(format!("'{value}' is longer than {MAX_WAIT_SECONDS} seconds"));
    }
    Ok(seconds)
}

/// True when the invocation rewrites the config file instead of booking.
pub fn is_config_update(args: &Args) -> bool {
    args.new_token.is_some() || args.clear_token || args.new_base_url.is_some()
}

/// Court booking client for the campus venue booking service.
///
/// Polls slot availability for a date, books slots that match the preferred
/// courts and start times, and retries until something is booked or the
/// attempt limit is reached.
///
/// Without --schedule-time a single run starts immediately. With it, the
/// tool waits and runs every day at that time (in the venue's timezone)
/// until interrupted with Ctrl-C.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    /// Session token from the venue's web client (the `token` cookie).
    /// Falls back to COURT_BOOKER_TOKEN, then the config file.
    #[arg(short = 'k', long = "token", help_heading = "Booking")]
    pub token: Option<String>,

    /// Date to book in YYYY-MM-DD format. Defaults to tomorrow in the
    /// venue's timezone, re-evaluated at every scheduled run.
    #[arg(short = 'd', long = "date", help_heading = "Booking")]
    pub date: Option<String>,

    /// Preferred court name, exactly as the service lists it. Repeatable.
    #[arg(short = 'c', long = "court", num_args = 1.., help_heading = "Booking")]
    pub courts: Vec<String>,

    /// Preferred start time in HH:MM, in order of preference. Repeatable.
    #[arg(
        short = 't',
        long = "time",
        num_args = 1..,
        value_parser = parse_hhmm,
        help_heading = "Booking"
    )]
    pub times: Vec<String>,

    /// Event id identifying the venue booking page. Defaults to the config value.
    #[arg(short = 'e', long = "event", help_heading = "Booking")]
    pub event_id: Option<String>,

    /// Book every matching slot instead of stopping at the first success.
    #[arg(long = "book-all", help_heading = "Booking")]
    pub book_all: bool,

    /// Maximum number of attempts per run. Values below 1 are treated as 1.
    #[arg(long = "max-retries", allow_negative_numbers = true, help_heading = "Retry")]
    pub max_retries: Option<i64>,

    /// Seconds to wait between attempts. Fractions allowed.
    #[arg(long = "retry-delay", value_parser = parse_seconds, help_heading = "Retry")]
    pub retry_delay: Option<f64>,

    /// Seconds to wait before each submission within a batch.
    #[arg(long = "booking-gap", value_parser = parse_seconds, help_heading = "Retry")]
    pub booking_gap: Option<f64>,

    /// Keep polling without an attempt limit until a booking succeeds.
    #[arg(long = "poll-forever", conflicts_with = "max_retries", help_heading = "Retry")]
    pub poll_forever: bool,

    /// Run every day at this HH:MM time (venue timezone) instead of once now.
    #[arg(
        short = 's',
        long = "schedule-time",
        value_parser = parse_hhmm,
        help_heading = "Schedule"
    )]
    pub schedule_time: Option<String>,

    /// Save a session token to the config file.
    #[arg(long = "set-token", value_name = "TOKEN", help_heading = "Configuration")]
    pub new_token: Option<String>,

    /// Remove the saved session token from the config file.
    #[arg(long = "clear-token", conflicts_with = "new_token", help_heading = "Configuration")]
    pub clear_token: bool,

    /// Save a different service base URL to the config file.
    #[arg(long = "set-base-url", value_name = "URL", help_heading = "Configuration")]
    pub new_base_url: Option<String>,

    /// List current configuration settings
    #[arg(long = "list-config", short = 'l', help_heading = "Configuration")]
    pub list_config: bool,

    /// Log at debug level, including request and matching details.
    #[arg(long = "debug", help_heading = "Debug")]
    pub debug: bool,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", help_heading = "Debug")]
    pub log_file: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_booking_invocation() {
        let args = Args::try_parse_from([
            "court_booker",
            "-k",
            "tok",
            "-d",
            "2025-04-15",
            "-c",
            "Court1",
            "Court2",
            "-t",
            "19:00",
            "-t",
            "20:00",
            "--book-all",
            "--retry-delay",
            "0.5",
            "-s",
            "08:04",
        ])
        .unwrap();

        assert_eq!(args.token.as_deref(), Some("tok"));
        assert_eq!(args.courts, ["Court1", "Court2"]);
        assert_eq!(args.times, ["19:00", "20:00"]);
        assert!(args.book_all);
        assert_eq!(args.retry_delay, Some(0.5));
        assert_eq!(args.schedule_time.as_deref(), Some("08:04"));
        assert!(!is_config_update(&args));
        assert!(!args.list_config);
    }

    #[test]
    fn test_rejects_loose_times() {
        assert!(Args::try_parse_from(["court_booker", "-t", "8:04"]).is_err());
        assert!(Args::try_parse_from(["court_booker", "-s", "25:00"]).is_err());
    }

    #[test]
    fn test_rejects_negative_delay() {
        assert!(Args::try_parse_from(["court_booker", "--retry-delay", "-1"]).is_err());
        assert!(Args::try_parse_from(["court_booker", "--booking-gap", "soon"]).is_err());
    }

    #[test]
    fn test_rejects_oversized_delay() {
        assert!(Args::try_parse_from(["court_booker", "--retry-delay", "1e20"]).is_err());
        assert!(Args::try_parse_from(["court_booker", "--booking-gap", "86401"]).is_err());
        let args = Args::try_parse_from(["court_booker", "--retry-delay", "86400"]).unwrap();
        assert_eq!(args.retry_delay, Some(86_400.0));
    }

    #[test]
    fn test_negative_max_retries_parses() {
        let args = Args::try_parse_from(["court_booker", "--max-retries", "-1"]).unwrap();
        assert_eq!(args.max_retries, Some(-1));
    }

    #[test]
    fn test_poll_forever_conflicts_with_max_retries() {
        assert!(
            Args::try_parse_from(["court_booker", "--poll-forever", "--max-retries", "3"]).is_err()
        );
    }

    #[test]
    fn test_config_commands_detected() {
        let args = Args::try_parse_from(["court_booker", "--set-token", "abc"]).unwrap();
        assert!(is_config_update(&args));
        let args = Args::try_parse_from(["court_booker", "--clear-token"]).unwrap();
        assert!(is_config_update(&args));
        let args = Args::try_parse_from(["court_booker", "--list-config"]).unwrap();
        assert!(args.list_config);
        assert!(!is_config_update(&args));
    }
}
