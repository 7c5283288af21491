//! Availability search: one POST per call, fresh data every time

use chrono::NaiveDate;
use reqwest::Client;
use tracing::{info, instrument, warn};

use super::fetch_utils::post_json;
use super::http_client::ApiSession;
use super::urls::build_search_url;
use crate::booking::models::{Resource, SlotListData, SlotQuery};
use crate::error::AppError;

/// Fetches every court and its slots for `date` under `event_id`.
///
/// Succeeds only on HTTP 2xx with a parseable body whose `status` is 0. A
/// successful body without `data.list` yields an empty list.
#[instrument(skip(client, session))]
pub async fn query_availability(
    client: &Client,
    session: &ApiSession,
    date: NaiveDate,
    event_id: &str,
) -> Result<Vec<Resource>, AppError> {
    let url = build_search_url(&session.base_url);
    let query = SlotQuery::new(date, event_id);
    info!("Querying slots for {} (event {})", date, event_id);

    let accepted = post_json::<_, SlotListData>(
        client,
        session,
        &url,
        event_id,
        &query,
        session.query_timeout,
    )
    .await?
    .into_result()
    .inspect_err(|e| {
        if e.needs_credential_refresh() {
            warn!("Slot query rejected the session token; refresh it before the next run");
        }
    })?;

    let resources = accepted.data.unwrap_or_default().list;
    info!("Query returned {} courts", resources.len());
    Ok(resources)
}
