//! Preference matching over freshly fetched slot data

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::models::{BookingRecord, Resource};
use super::plan::Preferences;

/// Result of matching one availability snapshot against the preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    /// Bookable slots, in resource order then preferred-time order.
    pub records: Vec<BookingRecord>,
    /// Preferred courts that did not appear in the snapshot at all.
    pub missing_courts: Vec<String>,
}

impl MatchReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Finds every bookable slot on a preferred court starting at a preferred time.
///
/// Matching is exact on court name and start time. A preferred court missing
/// from `resources` is reported but does not stop the others from matching.
/// Each slot is emitted at most once even if the service lists it twice.
pub fn find_available(
    resources: &[Resource],
    preferences: &Preferences,
    date: NaiveDate,
) -> MatchReport {
    let mut report = MatchReport::default();

    if resources.is_empty() {
        warn!("No courts returned for {date}");
    }

    let mut found_courts: HashSet<&str> = HashSet::new();

    for resource in resources.iter().filter(|r| preferences.wants_court(&r.name)) {
        found_courts.insert(resource.name.as_str());
        debug!("Checking court {} (id {})", resource.name, resource.id);

        let mut seen_slots: HashSet<(&str, &str)> = HashSet::new();
        for time in preferences.times() {
            for slot in resource.slots.iter().filter(|s| &s.start_time == time) {
                if !slot.is_bookable() {
                    debug!(
                        "{} {} is taken (status {})",
                        resource.name,
                        slot.display_time(),
                        slot.status
                    );
                    continue;
                }
                if !seen_slots.insert((slot.slot_id.as_str(), slot.schedule_id.as_str())) {
                    continue;
                }
                info!("Bookable: {} {}", resource.name, slot.display_time());
                report.records.push(BookingRecord::new(date, resource, slot));
            }
        }
    }

    report.missing_courts = preferences
        .courts()
        .iter()
        .filter(|c| !found_courts.contains(c.as_str()))
        .cloned()
        .collect();

    if !report.missing_courts.is_empty() {
        warn!(
            "Preferred courts not in the response: {}",
            report.missing_courts.join(", ")
        );
    }

    if report.records.is_empty() {
        info!("No preferred slot is bookable right now");
    }

    report
}
