//! URL building utilities for the reservation endpoints

use crate::constants::endpoints;

/// Builds the availability search URL.
///
/// # Example
/// ```
/// use court_booker::booking::api::build_search_url;
///
/// let url = build_search_url("http://venue.example");
/// assert_eq!(url, "http://venue.example/api/v2/appBookGeneral/date/slot/searchByDate");
/// ```
pub fn build_search_url(base_url: &str) -> String {
    format!("{}{}", trim_base(base_url), endpoints::SEARCH_BY_DATE)
}

/// Builds the booking confirmation URL.
///
/// # Example
/// ```
/// use court_booker::booking::api::build_booking_url;
///
/// let url = build_booking_url("http://venue.example/");
/// assert_eq!(url, "http://venue.example/api/v2/appBookGeneral/book/afterConfirm");
/// ```
pub fn build_booking_url(base_url: &str) -> String {
    format!("{}{}", trim_base(base_url), endpoints::AFTER_CONFIRM)
}

/// Builds the `Referer` the web client sends for an event page.
///
/// The doubled `?` is what the real booking page uses.
pub fn build_referer(base_url: &str, event_id: &str) -> String {
    format!(
        "{}{}?type=eventInfo?eventId={event_id}",
        trim_base(base_url),
        endpoints::BOOKING_PAGE
    )
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
