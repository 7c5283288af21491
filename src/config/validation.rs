use crate::error::AppError;
use std::path::Path;

/// Largest UTC offset in use anywhere (Line Islands, +14:00)
const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Validates the configuration settings
///
/// # Validation Rules
/// - Base URL cannot be empty and must carry an http(s) scheme
/// - Event id cannot be empty
/// - Both request timeouts must be positive
/// - Schedule UTC offset must be within ±14 hours
/// - If a log file path is provided, it cannot be empty and its parent must be creatable
pub fn validate_config(
    base_url: &str,
    event_id: &str,
    log_file_path: &Option<String>,
    query_timeout_seconds: u64,
    booking_timeout_seconds: u64,
    schedule_utc_offset_hours: i32,
) -> Result<(), AppError> {
    if base_url.is_empty() {
        return Err(AppError::config_error("Base URL cannot be empty"));
    }

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(AppError::config_error(format!(
            "Base URL must start with http:// or https://, got '{base_url}'"
        )));
    }

    if event_id.trim().is_empty() {
        return Err(AppError::config_error("Event id cannot be empty"));
    }

    if query_timeout_seconds == 0 || booking_timeout_seconds == 0 {
        return Err(AppError::config_error(
            "Request timeouts must be at least one second",
        ));
    }

    if !(-MAX_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&schedule_utc_offset_hours) {
        return Err(AppError::config_error(format!(
            "Schedule UTC offset {schedule_utc_offset_hours} is outside ±{MAX_UTC_OFFSET_HOURS} hours"
        )));
    }

    if let Some(log_path) = log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        if let Some(parent) = Path::new(log_path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
