use super::slots::{Resource, Slot};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

/// One slot reservation, in exactly the shape `afterConfirm` expects.
///
/// Built only through [`BookingRecord::new`], which fills the fields the
/// remote service requires even when they carry no information (`price`,
/// `seatId`). Leaving any of them out makes the service answer that the
/// booking slot must not be empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub book_date: String,
    pub book_slot_id: String,
    pub book_slot: String,
    pub number: u32,
    pub price: String,
    pub resource_id: String,
    pub slot_order: i64,
    pub seat_id: String,
    pub schedule_id: String,
    /// Court name for log lines; never sent.
    #[serde(skip)]
    pub resource_name: String,
}

impl BookingRecord {
    pub fn new(date: NaiveDate, resource: &Resource, slot: &Slot) -> Self {
        Self {
            book_date: date.format("%Y-%m-%d").to_string(),
            book_slot_id: slot.slot_id.clone(),
            book_slot: slot.display_time(),
            number: 1,
            price: String::new(),
            resource_id: resource.id.clone(),
            slot_order: slot.slot_order,
            seat_id: String::new(),
            schedule_id: slot.schedule_id.clone(),
            resource_name: resource.name.clone(),
        }
    }

    /// "Court 1 10:00-11:00"
    pub fn target_label(&self) -> String {
        format!("{} {}", self.resource_name, self.book_slot)
    }
}

/// Request body for `afterConfirm`. Always carries exactly one record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest<'a> {
    pub event_id: &'a str,
    pub ext_attr: &'static str,
    pub pay_amount: u32,
    pub records: [&'a BookingRecord; 1],
}

impl<'a> BookingRequest<'a> {
    pub fn single(event_id: &'a str, record: &'a BookingRecord) -> Self {
        Self {
            event_id,
            ext_attr: "",
            pay_amount: 0,
            records: [record],
        }
    }
}

/// What the service told us after accepting a booking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingConfirmation {
    /// Order identifier from `extdata.id`, falling back to a string `data`.
    pub order_id: Option<String>,
    pub message: Option<String>,
}

impl BookingConfirmation {
    pub fn from_parts(message: Option<String>, data: Option<Value>, extdata: Option<Value>) -> Self {
        let from_extdata = extdata
            .as_ref()
            .and_then(|ext| ext.get("id"))
            .and_then(value_as_id);
        let from_data = data.as_ref().and_then(value_as_id);

        Self {
            order_id: from_extdata.or(from_data),
            message,
        }
    }
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
