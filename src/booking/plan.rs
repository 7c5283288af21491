//! Immutable run settings: what to book, how hard to try

use crate::constants::retry;
use crate::error::AppError;
use chrono::{DateTime, Duration as DateDuration, FixedOffset, NaiveDate, NaiveTime};
use std::time::Duration;

/// Checks a strict `HH:MM` wall-clock time (00:00 through 23:59).
///
/// Single-digit hours and seconds are rejected so the value can be compared
/// verbatim against the `startTime` strings the service returns.
pub fn validate_time_format(value: &str) -> Result<String, AppError> {
    let in_range = value.len() == 5
        && value.chars().all(|c| c.is_ascii_digit() || c == ':')
        && NaiveTime::parse_from_str(value, "%H:%M").is_ok();

    if in_range {
        Ok(value.to_string())
    } else {
        Err(AppError::config_error(format!(
            "Invalid time '{value}': use HH:MM, for example 08:04 or 15:30"
        )))
    }
}

/// Courts and start times to look for. Order is kept; duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    courts: Vec<String>,
    times: Vec<String>,
}

impl Preferences {
    pub fn new<C, T>(courts: C, times: T) -> Result<Self, AppError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let courts = dedup(courts.into_iter().map(Into::into));
        let times = dedup(times.into_iter().map(Into::into));

        if courts.is_empty() {
            return Err(AppError::config_error("At least one court is required"));
        }
        if times.is_empty() {
            return Err(AppError::config_error("At least one start time is required"));
        }
        for time in &times {
            validate_time_format(time)?;
        }

        Ok(Self { courts, times })
    }

    pub fn courts(&self) -> &[String] {
        &self.courts
    }

    pub fn times(&self) -> &[String] {
        &self.times
    }

    pub fn wants_court(&self, name: &str) -> bool {
        self.courts.iter().any(|c| c == name)
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// What to do after a booking in a batch succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPolicy {
    /// Stop the batch and the run at the first success.
    FirstMatch,
    /// Try every matched record in the batch.
    BookAll,
}

impl BookingPolicy {
    pub fn from_book_all(book_all: bool) -> Self {
        if book_all {
            BookingPolicy::BookAll
        } else {
            BookingPolicy::FirstMatch
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BookingPolicy::FirstMatch => "stop after the first successful booking",
            BookingPolicy::BookAll => "book every matching slot",
        }
    }
}

/// How many attempts one invocation may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptLimit {
    Bounded(u32),
    /// Keep polling until something is booked or the run is cancelled.
    Unlimited,
}

impl AttemptLimit {
    /// Zero is clamped to one attempt.
    pub fn bounded(max_attempts: u32) -> Self {
        AttemptLimit::Bounded(max_attempts.max(1))
    }

    pub fn allows(&self, attempts_so_far: u32) -> bool {
        match self {
            AttemptLimit::Bounded(max) => attempts_so_far < *max,
            AttemptLimit::Unlimited => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub limit: AttemptLimit,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Pause before each submission inside a batch.
    pub booking_gap: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            limit: AttemptLimit::Bounded(retry::DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(retry::DEFAULT_RETRY_DELAY_MS),
            booking_gap: Duration::from_millis(retry::DEFAULT_BOOKING_GAP_MS),
        }
    }
}

/// Target date: fixed, or "tomorrow" re-evaluated at every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    Fixed(NaiveDate),
    Tomorrow,
}

impl DateSelection {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            None => Ok(DateSelection::Tomorrow),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(DateSelection::Fixed)
                .map_err(|e| {
                    AppError::datetime_parse_error(format!(
                        "Invalid date '{raw}', expected YYYY-MM-DD: {e}"
                    ))
                }),
        }
    }

    pub fn resolve(&self, now: DateTime<FixedOffset>) -> NaiveDate {
        match self {
            DateSelection::Fixed(date) => *date,
            DateSelection::Tomorrow => now.date_naive() + DateDuration::days(1),
        }
    }
}

/// Everything one orchestrator run needs, fixed before the first attempt.
#[derive(Debug, Clone)]
pub struct BookingPlan {
    pub date: NaiveDate,
    pub event_id: String,
    pub preferences: Preferences,
    pub policy: BookingPolicy,
    pub retry: RetrySettings,
}
