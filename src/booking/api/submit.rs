//! Booking submission: one record per `afterConfirm` call

use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use super::fetch_utils::post_json;
use super::http_client::ApiSession;
use super::urls::build_booking_url;
use crate::booking::models::{BookingConfirmation, BookingRecord, BookingRequest};
use crate::constants::remote_messages;
use crate::error::AppError;

/// Reserves the slot described by `record`.
///
/// Success means body-level `status == 0`. On failure the remote message is
/// surfaced verbatim in the error; HTTP 401/403 and auth-failure messages are
/// classified as auth errors, everything else as a remote rejection (usually
/// someone else got the slot first).
#[instrument(skip(client, session, record), fields(target = %record.target_label()))]
pub async fn submit_booking(
    client: &Client,
    session: &ApiSession,
    record: &BookingRecord,
    event_id: &str,
) -> Result<BookingConfirmation, AppError> {
    let url = build_booking_url(&session.base_url);
    let request = BookingRequest::single(event_id, record);
    info!("Submitting booking for {}", record.target_label());

    let envelope = post_json::<_, Value>(
        client,
        session,
        &url,
        event_id,
        &request,
        session.booking_timeout,
    )
    .await?;

    match envelope.into_result() {
        Ok(accepted) => {
            let confirmation =
                BookingConfirmation::from_parts(accepted.message, accepted.data, accepted.extdata);
            info!(
                "Booked {} (order: {})",
                record.target_label(),
                confirmation.order_id.as_deref().unwrap_or("n/a")
            );
            Ok(confirmation)
        }
        Err(e) => {
            log_rejection_hint(&e, record);
            Err(e)
        }
    }
}

fn log_rejection_hint(e: &AppError, record: &BookingRecord) {
    let message = e.remote_message().unwrap_or_default();
    warn!("Booking {} refused: {}", record.target_label(), message);

    if message.contains(remote_messages::EMPTY_BOOKING_SLOT) {
        error!("Service reports an incomplete booking record: {:?}", record);
    }
    if message.contains(remote_messages::OUTSIDE_BOOKING_WINDOW) {
        warn!("Date {} is outside the open booking window", record.book_date);
    }
    if e.needs_credential_refresh() {
        warn!("Session token looks expired or lacks permission; refresh it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::api::http_client::create_http_client;
    use crate::booking::models::{Resource, Slot};
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    const BOOK_PATH: &str = "/api/v2/appBookGeneral/book/afterConfirm";

    fn record() -> BookingRecord {
        let resource = Resource {
            id: "r1".to_string(),
            name: "Court1".to_string(),
            slots: vec![],
        };
        let slot = Slot {
            slot_id: "s1".to_string(),
            schedule_id: "sc1".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:00".to_string(),
            status: 0,
            slot_order: 1,
            booked_nums: 0,
        };
        BookingRecord::new(NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(), &resource, &slot)
    }

    #[tokio::test]
    async fn test_submit_success_sends_full_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BOOK_PATH))
            .and(header("cookie", "token=tok"))
            .and(body_json(json!({
                "eventId": "evt",
                "extAttr": "",
                "payAmount": 0,
                "records": [{
                    "bookDate": "2025-04-15",
                    "bookSlotId": "s1",
                    "bookSlot": "10:00-11:00",
                    "number": 1,
                    "price": "",
                    "resourceId": "r1",
                    "slotOrder": 1,
                    "seatId": "",
                    "scheduleId": "sc1"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 0,
                "message": "预约成功",
                "data": "",
                "extdata": {"id": "order-77"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session = ApiSession::new(mock_server.uri(), "tok");
        let confirmation = submit_booking(&create_http_client().unwrap(), &session, &record(), "evt")
            .await
            .unwrap();

        assert_eq!(confirmation.order_id.as_deref(), Some("order-77"));
        assert_eq!(confirmation.message.as_deref(), Some("预约成功"));
    }

    #[tokio::test]
    async fn test_submit_nonzero_status_surfaces_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BOOK_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 1, "message": "该时段已被预约"})),
            )
            .mount(&mock_server)
            .await;

        let session = ApiSession::new(mock_server.uri(), "tok");
        let err = submit_booking(&create_http_client().unwrap(), &session, &record(), "evt")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RemoteRejection { status: 1, .. }));
        assert_eq!(err.remote_message(), Some("该时段已被预约"));
    }

    #[tokio::test]
    async fn test_submit_auth_marker_is_auth_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BOOK_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": 9999, "message": "认证失败"})),
            )
            .mount(&mock_server)
            .await;

        let session = ApiSession::new(mock_server.uri(), "tok");
        let err = submit_booking(&create_http_client().unwrap(), &session, &record(), "evt")
            .await
            .unwrap_err();

        assert!(err.needs_credential_refresh());
    }

    #[tokio::test]
    async fn test_submit_forbidden_is_auth_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BOOK_PATH))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let session = ApiSession::new(mock_server.uri(), "tok");
        let err = submit_booking(&create_http_client().unwrap(), &session, &record(), "evt")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ApiAuth { status: 403, .. }));
    }
}
