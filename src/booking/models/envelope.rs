use crate::error::AppError;
use serde::Deserialize;
use serde_json::Value;

/// Body-level status the remote service uses for success.
pub const STATUS_OK: i64 = 0;

/// Common wrapper around every response body: `{status, message?, data?, extdata?}`.
///
/// The remote status lives in the body independently of the HTTP status.
/// Call [`ApiEnvelope::into_result`] right after parsing so nothing
/// downstream has to look at the raw integer.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub extdata: Option<Value>,
}

/// The parts of an envelope whose status was [`STATUS_OK`].
#[derive(Debug, Clone)]
pub struct Accepted<T> {
    pub message: Option<String>,
    pub data: Option<T>,
    pub extdata: Option<Value>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<Accepted<T>, AppError> {
        if self.status == STATUS_OK {
            Ok(Accepted {
                message: self.message,
                data: self.data,
                extdata: self.extdata,
            })
        } else {
            let message = self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "no message".to_string());
            Err(AppError::remote_rejection(self.status, message))
        }
    }
}
