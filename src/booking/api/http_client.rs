//! HTTP client creation and the per-run session settings

use crate::config::Config;
use crate::constants::{self, headers};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

/// Everything a request needs besides its body. Read-only for the whole run.
#[derive(Debug, Clone)]
pub struct ApiSession {
    pub base_url: String,
    pub token: String,
    pub query_timeout: Duration,
    pub booking_timeout: Duration,
}

impl ApiSession {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            query_timeout: Duration::from_secs(constants::DEFAULT_QUERY_TIMEOUT_SECONDS),
            booking_timeout: Duration::from_secs(constants::DEFAULT_BOOKING_TIMEOUT_SECONDS),
        }
    }

    pub fn from_config(config: &Config, token: impl Into<String>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            token: token.into(),
            query_timeout: Duration::from_secs(config.query_timeout_seconds),
            booking_timeout: Duration::from_secs(config.booking_timeout_seconds),
        }
    }

    /// Value of the `Cookie` header carrying the session token.
    pub fn cookie(&self) -> String {
        format!("token={}", self.token)
    }
}

/// Creates the HTTP client shared by queries and bookings.
///
/// Carries the headers the remote service expects from its WeChat web
/// client. Timeouts are set per request since queries and bookings differ.
pub fn create_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(headers::USER_AGENT));
    default_headers.insert(ACCEPT, HeaderValue::from_static(headers::ACCEPT));
    default_headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(headers::ACCEPT_LANGUAGE),
    );
    default_headers.insert(
        "X-Requested-With",
        HeaderValue::from_static(headers::REQUESTED_WITH),
    );

    Client::builder()
        .default_headers(default_headers)
        .pool_max_idle_per_host(constants::HTTP_POOL_MAX_IDLE_PER_HOST)
        .build()
}
