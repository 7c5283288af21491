//! Daily trigger: run the booking once per day at a wall-clock time

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Days, FixedOffset, NaiveTime, Timelike, Utc};
use tracing::{debug, info, warn};

use crate::booking::plan::validate_time_format;
use crate::constants::schedule::TICK_MS;
use crate::error::AppError;
use crate::shutdown::Shutdown;

/// Timestamp format used for the start/end lines around each invocation.
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// A wall-clock time evaluated in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    offset: FixedOffset,
}

impl DailySchedule {
    /// Parses a strict `HH:MM` trigger time.
    pub fn parse(hhmm: &str, offset: FixedOffset) -> Result<Self, AppError> {
        let valid = validate_time_format(hhmm)?;
        let at = NaiveTime::parse_from_str(&valid, "%H:%M")
            .map_err(|e| AppError::datetime_parse_error(format!("Invalid time '{hhmm}': {e}")))?;
        Ok(Self { at, offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current time in the schedule's offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// First trigger strictly after `now` unless `now` is exactly on it.
    ///
    /// Starting after today's trigger time schedules tomorrow; the run is
    /// never fired retroactively.
    pub fn next_trigger(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let today = now.date_naive();
        let candidate = today.and_time(self.at);
        let date = if now.naive_local() <= candidate {
            today
        } else {
            today.checked_add_days(Days::new(1)).unwrap_or(today)
        };
        // A fixed offset has no gaps or folds, so this is always Single.
        date.and_time(self.at)
            .and_local_timezone(self.offset)
            .single()
            .unwrap_or(now)
    }

    pub fn describe(&self) -> String {
        format!("daily at {} (UTC{})", self.at.format("%H:%M"), self.offset)
    }
}

/// Runs `job` every day at the scheduled time until shutdown.
///
/// The trigger condition is checked once per second and a waiting line is
/// logged once per minute. A job error is logged and the schedule carries
/// on to the next day.
pub async fn run_daily<F, Fut>(
    schedule: DailySchedule,
    shutdown: Shutdown,
    job: F,
) -> Result<u32, AppError>
where
    F: FnMut(DateTime<FixedOffset>) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    run_daily_with_clock(
        schedule,
        shutdown,
        Duration::from_millis(TICK_MS),
        || schedule.now(),
        job,
    )
    .await
}

pub(crate) async fn run_daily_with_clock<C, F, Fut>(
    schedule: DailySchedule,
    mut shutdown: Shutdown,
    tick: Duration,
    clock: C,
    mut job: F,
) -> Result<u32, AppError>
where
    C: Fn() -> DateTime<FixedOffset>,
    F: FnMut(DateTime<FixedOffset>) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let mut next = schedule.next_trigger(clock());
    let mut last_logged_minute: Option<u32> = None;
    let mut runs = 0u32;

    info!(
        "Scheduled {}; next run at {}. Press Ctrl-C to stop",
        schedule.describe(),
        next.format(STAMP_FORMAT)
    );

    loop {
        let now = clock();

        if now >= next {
            runs += 1;
            info!("--- Scheduled run {runs} started ({}) ---", now.format(STAMP_FORMAT));
            if let Err(e) = job(now).await {
                warn!("Scheduled run {runs} failed: {e}");
            }
            let finished = clock();
            info!(
                "--- Scheduled run {runs} finished ({}) ---",
                finished.format(STAMP_FORMAT)
            );

            next = schedule.next_trigger(finished);
            // A run that ends within the trigger minute must not fire again today.
            if next <= now {
                next = schedule.next_trigger(finished + chrono::Duration::seconds(60));
            }
            info!("Next run at {}", next.format(STAMP_FORMAT));
        } else if last_logged_minute != Some(now.minute()) {
            info!(
                "Now {}, waiting for {}",
                now.format("%Y-%m-%d %H:%M"),
                next.format("%H:%M")
            );
            last_logged_minute = Some(now.minute());
        }

        if shutdown.sleep(tick).await {
            debug!("Scheduler tick interrupted");
            break;
        }
    }

    info!(
        "Scheduler stopped after {runs} run(s) ({})",
        clock().format(STAMP_FORMAT)
    );
    Ok(runs)
}
