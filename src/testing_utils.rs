use crate::booking::models::{Resource, SLOT_STATUS_BOOKABLE, Slot};
use serde_json::{Value, json};

/// Test utilities for building slot data and mock service responses
pub struct TestDataBuilder;

impl TestDataBuilder {
    /// Creates a one-hour slot with ids derived from `slot_id`
    pub fn slot(slot_id: &str, start_time: &str, status: i64) -> Slot {
        let end_time = Self::one_hour_later(start_time);
        Slot {
            slot_id: slot_id.to_string(),
            schedule_id: format!("sc-{slot_id}"),
            start_time: start_time.to_string(),
            end_time,
            status,
            slot_order: 1,
            booked_nums: 0,
        }
    }

    /// Creates a bookable one-hour slot
    pub fn free_slot(slot_id: &str, start_time: &str) -> Slot {
        Self::slot(slot_id, start_time, SLOT_STATUS_BOOKABLE)
    }

    /// Creates a court with the given slots
    pub fn court(id: &str, name: &str, slots: Vec<Slot>) -> Resource {
        Resource {
            id: id.to_string(),
            name: name.to_string(),
            slots,
        }
    }

    /// Wire JSON for one court, as `searchByDate` lists it
    pub fn court_json(court: &Resource) -> Value {
        let slots: Vec<Value> = court
            .slots
            .iter()
            .map(|s| {
                json!({
                    "slotId": s.slot_id,
                    "scheduleId": s.schedule_id,
                    "startTime": s.start_time,
                    "endTime": s.end_time,
                    "status": s.status,
                    "slotOrder": s.slot_order,
                    "bookedNums": s.booked_nums,
                })
            })
            .collect();
        json!({"id": court.id, "name": court.name, "slotInfo": slots})
    }

    /// A successful `searchByDate` body listing `courts`
    pub fn search_response(courts: &[Resource]) -> Value {
        let list: Vec<Value> = courts.iter().map(Self::court_json).collect();
        json!({"status": 0, "message": "success", "data": {"list": list}})
    }

    /// A successful `afterConfirm` body carrying an order id
    pub fn booking_accepted(order_id: &str) -> Value {
        json!({"status": 0, "message": "预约成功", "data": "", "extdata": {"id": order_id}})
    }

    /// Any envelope refused with `status` and `message`
    pub fn rejected(status: i64, message: &str) -> Value {
        json!({"status": status, "message": message})
    }

    fn one_hour_later(start_time: &str) -> String {
        let hour: u32 = start_time
            .get(..2)
            .and_then(|h| h.parse().ok())
            .unwrap_or(0);
        let minutes = start_time.get(2..).unwrap_or(":00");
        format!("{:02}{}", (hour + 1) % 24, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_end_time() {
        let slot = TestDataBuilder::free_slot("s1", "10:00");
        assert_eq!(slot.display_time(), "10:00-11:00");
        assert!(slot.is_bookable());
        assert_eq!(TestDataBuilder::slot("s2", "23:30", 1).end_time, "00:30");
    }

    #[test]
    fn test_search_response_parses_back() {
        let courts = vec![TestDataBuilder::court(
            "r1",
            "Court1",
            vec![TestDataBuilder::free_slot("s1", "19:00")],
        )];
        let body = TestDataBuilder::search_response(&courts);

        let list: Vec<Resource> = serde_json::from_value(body["data"]["list"].clone()).unwrap();
        assert_eq!(list, courts);
    }
}
