pub mod http_client;
pub mod urls;
mod fetch_utils;
mod query;
mod submit;

pub use http_client::{ApiSession, create_http_client};
pub use query::query_availability;
pub use submit::submit_booking;
pub use urls::*;
