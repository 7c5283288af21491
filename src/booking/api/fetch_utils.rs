//! JSON POST helper with the error mapping shared by both endpoints

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE, ORIGIN, REFERER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::http_client::ApiSession;
use super::urls::build_referer;
use crate::booking::models::ApiEnvelope;
use crate::error::AppError;

/// Sends one JSON POST and parses the response envelope.
///
/// No retries happen here; the orchestrator owns the retry policy.
///
/// # Errors
/// * `NetworkTimeout` / `NetworkConnection` - transport failures
/// * `ApiAuth` - HTTP 401 or 403
/// * `ApiHttpStatus` - any other non-2xx status
/// * `ApiNoData` / `ApiMalformedJson` / `ApiUnexpectedStructure` - body could not be parsed
///
/// The body-level status is left for the caller, via [`ApiEnvelope::into_result`].
#[instrument(skip(client, session, body), fields(url = %url))]
pub(super) async fn post_json<B, T>(
    client: &Client,
    session: &ApiSession,
    url: &str,
    event_id: &str,
    body: &B,
    timeout: Duration,
) -> Result<ApiEnvelope<T>, AppError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = client
        .post(url)
        .timeout(timeout)
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, session.cookie())
        .header(ORIGIN, session.base_url.trim_end_matches('/'))
        .header(REFERER, build_referer(&session.base_url, event_id))
        .json(body)
        .send()
        .await
        .map_err(|e| map_request_error(e, url))?;

    let status = response.status();
    debug!("Response status: {status}");

    if !status.is_success() {
        let status_code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or("Unknown error");
        error!("HTTP {} - {} (URL: {})", status_code, reason, url);

        return Err(match status_code {
            401 | 403 => AppError::api_auth(status_code, reason, url),
            _ => AppError::api_http_status(status_code, reason, url),
        });
    }

    let response_text = response
        .text()
        .await
        .map_err(|e| map_request_error(e, url))?;

    debug!("Response length: {} bytes", response_text.len());
    let preview: String = response_text.chars().take(1024).collect();
    debug!("Response text (first 1024 chars): {preview}");

    parse_envelope(&response_text, url)
}

fn map_request_error(e: reqwest::Error, url: &str) -> AppError {
    error!("Request failed for URL {}: {}", url, e);
    if e.is_timeout() {
        AppError::network_timeout(url)
    } else if e.is_connect() {
        AppError::network_connection(url, e.to_string())
    } else {
        AppError::ApiFetch(e)
    }
}

pub(super) fn parse_envelope<T: DeserializeOwned>(
    response_text: &str,
    url: &str,
) -> Result<ApiEnvelope<T>, AppError> {
    serde_json::from_str::<ApiEnvelope<T>>(response_text).map_err(|e| {
        error!("Failed to parse API response: {} (URL: {})", e, url);
        error!(
            "Response text (first 200 chars): {}",
            response_text.chars().take(200).collect::<String>()
        );

        let trimmed = response_text.trim_start();
        if trimmed.is_empty() {
            AppError::api_no_data("Response body is empty", url)
        } else if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
            AppError::api_malformed_json("Response is not valid JSON", url)
        } else {
            AppError::api_unexpected_structure(e.to_string(), url)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_parse_envelope_classification() {
        let empty = parse_envelope::<Value>("   ", "u").unwrap_err();
        assert!(matches!(empty, AppError::ApiNoData { .. }));

        let html = parse_envelope::<Value>("<html>502</html>", "u").unwrap_err();
        assert!(matches!(html, AppError::ApiMalformedJson { .. }));

        let wrong_shape = parse_envelope::<Value>("{\"message\": \"no status\"}", "u").unwrap_err();
        assert!(matches!(wrong_shape, AppError::ApiUnexpectedStructure { .. }));
    }

    #[test]
    fn test_parse_envelope_success() {
        let envelope = parse_envelope::<Value>("{\"status\": 0, \"data\": 1}", "u").unwrap();
        assert_eq!(envelope.status, 0);
    }
}
