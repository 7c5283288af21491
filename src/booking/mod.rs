pub mod api;
pub mod matcher;
pub mod models;
pub mod orchestrator;
pub mod plan;

pub use matcher::{MatchReport, find_available};
pub use orchestrator::{AttemptResult, BookingRun, RunOutcome, RunSummary, run_booking};
pub use plan::{
    AttemptLimit, BookingPlan, BookingPolicy, DateSelection, Preferences, RetrySettings,
    validate_time_format,
};
