use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Request body for the availability search.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotQuery {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    #[serde(rename = "eventId")]
    pub event_id: String,
}

impl SlotQuery {
    pub fn new(date: NaiveDate, event_id: impl Into<String>) -> Self {
        Self {
            date,
            event_id: event_id.into(),
        }
    }
}

fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
}

/// `data` payload of a successful availability search.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SlotListData {
    #[serde(default)]
    pub list: Vec<Resource>,
}

/// A bookable court with its slots for the queried date.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Resource {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "slotInfo", default)]
    pub slots: Vec<Slot>,
}

/// Slot status the remote service uses for "free to book".
pub const SLOT_STATUS_BOOKABLE: i64 = 0;

fn default_unavailable() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Slot {
    #[serde(rename = "slotId", deserialize_with = "lenient_string", default)]
    pub slot_id: String,
    #[serde(rename = "scheduleId", deserialize_with = "lenient_string", default)]
    pub schedule_id: String,
    #[serde(rename = "startTime", deserialize_with = "lenient_string", default)]
    pub start_time: String,
    #[serde(rename = "endTime", deserialize_with = "lenient_string", default)]
    pub end_time: String,
    /// Missing, null or non-numeric status counts as taken.
    #[serde(deserialize_with = "lenient_status", default = "default_unavailable")]
    pub status: i64,
    #[serde(rename = "slotOrder", deserialize_with = "lenient_number", default)]
    pub slot_order: i64,
    #[serde(rename = "bookedNums", deserialize_with = "lenient_number", default)]
    pub booked_nums: i64,
}

impl Slot {
    pub fn is_bookable(&self) -> bool {
        self.status == SLOT_STATUS_BOOKABLE
    }

    /// "start-end" label used both for display and as the `bookSlot` field.
    pub fn display_time(&self) -> String {
        format!("{}-{}", self.start_time, self.end_time)
    }
}

/// Identifiers arrive as strings from most deployments but as numbers from some.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Integer fields may come back as numbers, numeric strings or null.
fn number_from(value: serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(number_from(value).unwrap_or_default())
}

fn lenient_status<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(number_from(value).unwrap_or_else(default_unavailable))
}
