//! Court booking client for a venue reservation service
//!
//! Polls slot availability for a date, matches it against preferred courts
//! and start times, and submits bookings with bounded or unlimited retries,
//! either once or every day at a fixed wall-clock time.
//!
//! # Examples
//!
//! ```rust,no_run
//! use court_booker::booking::api::{ApiSession, create_http_client};
//! use court_booker::booking::{
//!     AttemptLimit, BookingPlan, BookingPolicy, Preferences, RetrySettings, run_booking,
//! };
//! use court_booker::error::AppError;
//! use court_booker::shutdown::Shutdown;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let client = create_http_client()?;
//!     let session = ApiSession::new("http://wechatmeeting.nuist.edu.cn", "my-token");
//!     let plan = BookingPlan {
//!         date: chrono::NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
//!         event_id: "b8d2f7e00603f0f5af4de278c0b461b8".to_string(),
//!         preferences: Preferences::new(["场地1"], ["19:00", "20:00"])?,
//!         policy: BookingPolicy::FirstMatch,
//!         retry: RetrySettings {
//!             limit: AttemptLimit::bounded(20),
//!             ..RetrySettings::default()
//!         },
//!     };
//!
//!     let summary = run_booking(&client, &session, &plan, Shutdown::never()).await;
//!     println!("{} booking(s)", summary.total_booked);
//!     Ok(())
//! }
//! ```

pub mod booking;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod shutdown;
pub mod testing_utils;

// Re-export commonly used types for convenience
pub use booking::orchestrator::{RunOutcome, RunSummary, run_booking};
pub use config::Config;
pub use error::{AppError, FailureKind};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
