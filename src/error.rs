use crate::constants::remote_messages;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to reach booking API: {0}")]
    ApiFetch(#[from] reqwest::Error),

    // HTTP status errors
    #[error("API rejected credentials ({status}): {message} (URL: {url})")]
    ApiAuth {
        status: u16,
        message: String,
        url: String,
    },

    #[error("API returned HTTP {status}: {message} (URL: {url})")]
    ApiHttpStatus {
        status: u16,
        message: String,
        url: String,
    },

    // Network-specific errors
    #[error("Network timeout while calling: {url}")]
    NetworkTimeout { url: String },

    #[error("Connection failed to: {url} - {message}")]
    NetworkConnection { url: String, message: String },

    // Body parsing errors
    #[error("API returned malformed JSON: {message} (URL: {url})")]
    ApiMalformedJson { message: String, url: String },

    #[error("API returned unexpected data structure: {message} (URL: {url})")]
    ApiUnexpectedStructure { message: String, url: String },

    #[error("API returned empty or missing data: {message} (URL: {url})")]
    ApiNoData { message: String, url: String },

    // Body-level status != 0
    #[error("Remote service refused the request (status {status}): {message}")]
    RemoteRejection { status: i64, message: String },

    #[error("Remote service rejected the session token (status {status}): {message}")]
    RemoteAuthRejection { status: i64, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date/time parsing error: {0}")]
    DateTimeParse(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),

    #[error("Booking attempt panicked: {0}")]
    AttemptPanicked(String),
}

/// Coarse classification used by the retry loop and in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Config,
    Transport,
    Auth,
    RemoteRejection,
    Parse,
    Local,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Config => "config",
            FailureKind::Transport => "transport",
            FailureKind::Auth => "auth",
            FailureKind::RemoteRejection => "remote-rejection",
            FailureKind::Parse => "parse",
            FailureKind::Local => "local",
        };
        f.write_str(label)
    }
}

impl AppError {
    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a date/time parsing error with context
    pub fn datetime_parse_error(msg: impl Into<String>) -> Self {
        Self::DateTimeParse(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Create an authentication error for HTTP 401/403
    pub fn api_auth(status: u16, message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiAuth {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an error for any other non-2xx HTTP status
    pub fn api_http_status(status: u16, message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiHttpStatus {
            status,
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a network timeout error
    pub fn network_timeout(url: impl Into<String>) -> Self {
        Self::NetworkTimeout { url: url.into() }
    }

    /// Create a network connection error
    pub fn network_connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NetworkConnection {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a malformed JSON error
    pub fn api_malformed_json(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiMalformedJson {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an unexpected data structure error
    pub fn api_unexpected_structure(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiUnexpectedStructure {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create a no data error
    pub fn api_no_data(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::ApiNoData {
            message: message.into(),
            url: url.into(),
        }
    }

    /// Create an error from a non-zero body-level status.
    ///
    /// Messages carrying the remote authentication-failure marker become
    /// [`AppError::RemoteAuthRejection`]; every other status, including the
    /// ad hoc codes some deployments use for expired sessions, stays a plain
    /// rejection.
    pub fn remote_rejection(status: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(remote_messages::AUTH_FAILURE) {
            Self::RemoteAuthRejection { status, message }
        } else {
            Self::RemoteRejection { status, message }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AppError::ApiFetch(_)
            | AppError::NetworkTimeout { .. }
            | AppError::NetworkConnection { .. }
            | AppError::ApiHttpStatus { .. } => FailureKind::Transport,
            AppError::ApiAuth { .. } | AppError::RemoteAuthRejection { .. } => FailureKind::Auth,
            AppError::RemoteRejection { .. } => FailureKind::RemoteRejection,
            AppError::ApiMalformedJson { .. }
            | AppError::ApiUnexpectedStructure { .. }
            | AppError::ApiNoData { .. } => FailureKind::Parse,
            AppError::Config(_) | AppError::DateTimeParse(_) => FailureKind::Config,
            AppError::Io(_)
            | AppError::TomlSerialize(_)
            | AppError::TomlDeserialize(_)
            | AppError::LogSetup(_)
            | AppError::AttemptPanicked(_) => FailureKind::Local,
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::Transport
                | FailureKind::Auth
                | FailureKind::RemoteRejection
                | FailureKind::Parse
        )
    }

    /// Auth failures are retried, but the operator most likely has to supply a fresh token.
    pub fn needs_credential_refresh(&self) -> bool {
        self.kind() == FailureKind::Auth
    }

    /// The message the remote service sent, if this error carries one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            AppError::RemoteRejection { message, .. }
            | AppError::RemoteAuthRejection { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_helper() {
        let error = AppError::config_error("Missing session token");
        assert!(matches!(error, AppError::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: Missing session token");
        assert_eq!(error.kind(), FailureKind::Config);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_api_auth_helper() {
        let error = AppError::api_auth(401, "Unauthorized", "http://venue.example/api");
        assert_eq!(
            error.to_string(),
            "API rejected credentials (401): Unauthorized (URL: http://venue.example/api)"
        );
        assert_eq!(error.kind(), FailureKind::Auth);
        assert!(error.is_retryable());
        assert!(error.needs_credential_refresh());
    }

    #[test]
    fn test_http_status_is_transport() {
        let error = AppError::api_http_status(502, "Bad Gateway", "http://venue.example/api");
        assert_eq!(error.kind(), FailureKind::Transport);
        assert!(error.is_retryable());
        assert!(!error.needs_credential_refresh());
    }

    #[test]
    fn test_network_helpers() {
        let timeout = AppError::network_timeout("http://venue.example");
        assert_eq!(
            timeout.to_string(),
            "Network timeout while calling: http://venue.example"
        );
        assert_eq!(timeout.kind(), FailureKind::Transport);

        let connection = AppError::network_connection("http://venue.example", "Connection refused");
        assert_eq!(
            connection.to_string(),
            "Connection failed to: http://venue.example - Connection refused"
        );
        assert_eq!(connection.kind(), FailureKind::Transport);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            AppError::api_malformed_json("not json", "u").kind(),
            FailureKind::Parse
        );
        assert_eq!(
            AppError::api_unexpected_structure("missing field", "u").kind(),
            FailureKind::Parse
        );
        assert_eq!(AppError::api_no_data("empty", "u").kind(), FailureKind::Parse);
    }

    #[test]
    fn test_remote_rejection_keeps_message() {
        let error = AppError::remote_rejection(5, "该时段已被预约");
        assert!(matches!(error, AppError::RemoteRejection { status: 5, .. }));
        assert_eq!(error.remote_message(), Some("该时段已被预约"));
        assert_eq!(error.kind(), FailureKind::RemoteRejection);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_remote_rejection_with_auth_marker() {
        let error = AppError::remote_rejection(1, "认证失败，请重新登录");
        assert!(matches!(error, AppError::RemoteAuthRejection { .. }));
        assert!(error.needs_credential_refresh());
    }

    #[test]
    fn test_ad_hoc_auth_codes_stay_rejections() {
        for status in [9999, 4011] {
            let error = AppError::remote_rejection(status, "error");
            assert_eq!(error.kind(), FailureKind::RemoteRejection);
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();
        assert!(matches!(app_error, AppError::Io(_)));
        assert!(!app_error.is_retryable());
    }

    #[test]
    fn test_error_from_toml_deserialize() {
        let toml_error = toml::from_str::<serde_json::Value>("invalid = [toml").unwrap_err();
        let app_error: AppError = toml_error.into();
        assert!(matches!(app_error, AppError::TomlDeserialize(_)));
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::RemoteRejection.to_string(), "remote-rejection");
        assert_eq!(FailureKind::Auth.to_string(), "auth");
    }
}
