pub mod envelope;
pub mod records;
pub mod slots;

pub use envelope::{Accepted, ApiEnvelope, STATUS_OK};
pub use records::{BookingConfirmation, BookingRecord, BookingRequest};
pub use slots::{Resource, SLOT_STATUS_BOOKABLE, Slot, SlotListData, SlotQuery};
