//! Poll, match, book, retry: the state machine behind one booking run

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

use super::api::{ApiSession, query_availability, submit_booking};
use super::matcher::find_available;
use super::models::{BookingConfirmation, BookingRecord, Resource};
use super::plan::{AttemptLimit, BookingPlan, BookingPolicy};
use crate::error::{AppError, FailureKind};
use crate::shutdown::Shutdown;

/// Only the most recent attempts are kept for the summary; unlimited
/// polling would otherwise grow without bound.
const ATTEMPT_HISTORY_LIMIT: usize = 1000;

#[derive(Debug)]
enum RunState {
    Idle,
    Querying,
    Matching(Vec<Resource>),
    Booking(Vec<BookingRecord>),
    RetryPending,
    Succeeded,
    Exhausted,
    Cancelled,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one booking was confirmed.
    Succeeded,
    /// The attempt limit was reached without a booking.
    Exhausted,
    /// Shutdown was requested before anything was booked.
    Cancelled,
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded => "succeeded",
            RunOutcome::Exhausted => "exhausted",
            RunOutcome::Cancelled => "cancelled",
        }
    }
}

/// Per-attempt record kept for logs and the final summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub attempt_number: u32,
    pub booked_count: u32,
    /// Whether the run as a whole had a booking once this attempt ended.
    pub succeeded_overall: bool,
    /// Last failure seen during the attempt, if any.
    pub failure: Option<FailureKind>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub attempt_count: u32,
    pub total_booked: u32,
    pub confirmations: Vec<BookingConfirmation>,
    /// Most recent attempts, oldest first.
    pub attempts: Vec<AttemptResult>,
}

#[derive(Debug, Default)]
struct OpenAttempt {
    number: u32,
    booked: u32,
    failure: Option<FailureKind>,
}

/// Drives one booking run from the first query to a terminal state.
///
/// Attempts are strictly sequential and submissions inside a batch are
/// sent one at a time. Shutdown interrupts the waits between steps but
/// never an in-flight request.
pub struct BookingRun<'a> {
    client: &'a Client,
    session: &'a ApiSession,
    plan: &'a BookingPlan,
    shutdown: Shutdown,
    attempts: u32,
    current: Option<OpenAttempt>,
    total_booked: u32,
    confirmations: Vec<BookingConfirmation>,
    history: VecDeque<AttemptResult>,
    #[cfg(test)]
    panic_on_attempt: Option<u32>,
}

impl<'a> BookingRun<'a> {
    pub fn new(
        client: &'a Client,
        session: &'a ApiSession,
        plan: &'a BookingPlan,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            client,
            session,
            plan,
            shutdown,
            attempts: 0,
            current: None,
            total_booked: 0,
            confirmations: Vec::new(),
            history: VecDeque::new(),
            #[cfg(test)]
            panic_on_attempt: None,
        }
    }

    #[instrument(skip(self), fields(date = %self.plan.date))]
    pub async fn run(mut self) -> RunSummary {
        info!(
            "Booking run for {}: courts [{}], times [{}], {}",
            self.plan.date,
            self.plan.preferences.courts().join(", "),
            self.plan.preferences.times().join(", "),
            self.plan.policy.describe()
        );

        let mut state = RunState::Idle;
        let outcome = loop {
            state = match state {
                RunState::Succeeded => {
                    self.close_attempt();
                    break RunOutcome::Succeeded;
                }
                RunState::Exhausted => break RunOutcome::Exhausted,
                RunState::Cancelled => {
                    self.close_attempt();
                    break RunOutcome::Cancelled;
                }
                other => {
                    let stepped = AssertUnwindSafe(self.step(other)).catch_unwind().await;
                    match stepped {
                        Ok(next) => next,
                        Err(panic) => self.recover_from_panic(panic),
                    }
                }
            };
        };

        self.finish(outcome)
    }

    async fn step(&mut self, state: RunState) -> RunState {
        match state {
            RunState::Idle => RunState::Querying,
            RunState::Querying => self.query().await,
            RunState::Matching(resources) => self.match_slots(&resources),
            RunState::Booking(records) => self.book(records).await,
            RunState::RetryPending => self.retry_or_stop().await,
            terminal => terminal,
        }
    }

    async fn query(&mut self) -> RunState {
        if self.shutdown.is_triggered() {
            return RunState::Cancelled;
        }

        self.attempts = self.attempts.saturating_add(1);
        self.current = Some(OpenAttempt {
            number: self.attempts,
            ..OpenAttempt::default()
        });
        info!("--- Attempt {} ---", self.attempt_label());

        #[cfg(test)]
        if self.panic_on_attempt == Some(self.attempts) {
            panic!("forced failure in attempt {}", self.attempts);
        }

        match query_availability(self.client, self.session, self.plan.date, &self.plan.event_id)
            .await
        {
            Ok(resources) => RunState::Matching(resources),
            Err(e) => {
                warn!("Attempt {}: availability query failed: {e}", self.attempts);
                self.note_failure(&e);
                RunState::RetryPending
            }
        }
    }

    fn match_slots(&mut self, resources: &[Resource]) -> RunState {
        let report = find_available(resources, &self.plan.preferences, self.plan.date);
        if report.is_empty() {
            info!("Attempt {}: nothing to book yet", self.attempts);
            RunState::RetryPending
        } else {
            info!(
                "Attempt {}: {} matching slot(s)",
                self.attempts,
                report.records.len()
            );
            RunState::Booking(report.records)
        }
    }

    async fn book(&mut self, records: Vec<BookingRecord>) -> RunState {
        let mut booked_in_batch = 0u32;
        let mut cancelled = false;

        for record in &records {
            if self.shutdown.sleep(self.plan.retry.booking_gap).await {
                cancelled = true;
                break;
            }

            match submit_booking(self.client, self.session, record, &self.plan.event_id).await {
                Ok(confirmation) => {
                    info!(
                        "Attempt {}: booked {}",
                        self.attempts,
                        record.target_label()
                    );
                    booked_in_batch += 1;
                    self.total_booked += 1;
                    if let Some(open) = self.current.as_mut() {
                        open.booked += 1;
                    }
                    self.confirmations.push(confirmation);

                    if self.plan.policy == BookingPolicy::FirstMatch {
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        "Attempt {}: {} not booked ({}): {}",
                        self.attempts,
                        record.target_label(),
                        e.kind(),
                        e.remote_message().map_or_else(|| e.to_string(), str::to_string)
                    );
                    self.note_failure(&e);
                }
            }
        }

        if booked_in_batch > 0 {
            RunState::Succeeded
        } else if cancelled {
            RunState::Cancelled
        } else {
            RunState::RetryPending
        }
    }

    async fn retry_or_stop(&mut self) -> RunState {
        self.close_attempt();

        if !self.plan.retry.limit.allows(self.attempts) {
            warn!("Giving up after {} attempt(s)", self.attempts);
            return RunState::Exhausted;
        }

        debug!("Retrying in {:?}", self.plan.retry.retry_delay);
        if self.shutdown.sleep(self.plan.retry.retry_delay).await {
            RunState::Cancelled
        } else {
            RunState::Querying
        }
    }

    fn recover_from_panic(&mut self, panic: Box<dyn std::any::Any + Send>) -> RunState {
        let detail = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        let err = AppError::AttemptPanicked(detail);
        error!("Attempt {} aborted: {err}", self.attempts);
        self.note_failure(&err);

        let booked = self.current.as_ref().map_or(0, |open| open.booked);
        if booked > 0 {
            RunState::Succeeded
        } else if self.current.is_none() {
            // Nothing was opened; count this as a spent attempt anyway.
            self.attempts = self.attempts.saturating_add(1);
            self.current = Some(OpenAttempt {
                number: self.attempts,
                failure: Some(FailureKind::Local),
                ..OpenAttempt::default()
            });
            RunState::RetryPending
        } else {
            RunState::RetryPending
        }
    }

    fn note_failure(&mut self, e: &AppError) {
        if e.needs_credential_refresh() {
            warn!("Authentication was refused; the session token probably needs refreshing");
        } else if !e.is_retryable() {
            warn!("Local failure ({}); retrying is unlikely to help", e.kind());
        }
        if let Some(open) = self.current.as_mut() {
            open.failure = Some(e.kind());
        }
    }

    fn close_attempt(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let result = AttemptResult {
            attempt_number: open.number,
            booked_count: open.booked,
            succeeded_overall: self.total_booked > 0,
            failure: open.failure,
        };
        debug!("Attempt finished: {:?}", result);

        if self.history.len() == ATTEMPT_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(result);
    }

    fn attempt_label(&self) -> String {
        match self.plan.retry.limit {
            AttemptLimit::Bounded(max) => format!("{}/{}", self.attempts, max),
            AttemptLimit::Unlimited => format!("{}", self.attempts),
        }
    }

    fn finish(self, outcome: RunOutcome) -> RunSummary {
        match outcome {
            RunOutcome::Succeeded => info!(
                "Run succeeded: {} booking(s) after {} attempt(s)",
                self.total_booked, self.attempts
            ),
            RunOutcome::Exhausted => warn!(
                "Run exhausted: no booking after {} attempt(s)",
                self.attempts
            ),
            RunOutcome::Cancelled => info!(
                "Run cancelled after {} attempt(s), {} booking(s)",
                self.attempts, self.total_booked
            ),
        }

        RunSummary {
            outcome,
            attempt_count: self.attempts,
            total_booked: self.total_booked,
            confirmations: self.confirmations,
            attempts: self.history.into(),
        }
    }
}

/// Runs one booking invocation to completion.
pub async fn run_booking(
    client: &Client,
    session: &ApiSession,
    plan: &BookingPlan,
    shutdown: Shutdown,
) -> RunSummary {
    BookingRun::new(client, session, plan, shutdown).run().await
}
