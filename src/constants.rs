//! Application-wide constants and configuration values
//!
//! Remote endpoint paths, default run settings and the handful of remote
//! messages the booking flow knows how to interpret live here.

/// Default base URL of the venue reservation service
pub const DEFAULT_BASE_URL: &str = "http://wechatmeeting.nuist.edu.cn";

/// Default booking event (staff badminton courts)
pub const DEFAULT_EVENT_ID: &str = "b8d2f7e00603f0f5af4de278c0b461b8";

/// Timeout for the availability query in seconds
pub const DEFAULT_QUERY_TIMEOUT_SECONDS: u64 = 10;

/// Timeout for a booking submission in seconds
pub const DEFAULT_BOOKING_TIMEOUT_SECONDS: u64 = 15;

/// Maximum number of idle connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 4;

/// Venue wall clock is China Standard Time
pub const DEFAULT_SCHEDULE_UTC_OFFSET_HOURS: i32 = 8;

/// Remote endpoint paths, relative to the base URL
pub mod endpoints {
    pub const SEARCH_BY_DATE: &str = "/api/v2/appBookGeneral/date/slot/searchByDate";
    pub const AFTER_CONFIRM: &str = "/api/v2/appBookGeneral/book/afterConfirm";
    pub const BOOKING_PAGE: &str = "/wechat/book3/book.html";
}

/// Request header values the remote service expects from its WeChat client
pub mod headers {
    pub const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Mobile Safari/537.36 MicroMessenger/8.0.51";
    pub const ACCEPT: &str = "application/json, text/plain, */*";
    pub const REQUESTED_WITH: &str = "com.tencent.mm";
    pub const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";
}

/// Retry loop defaults
pub mod retry {
    /// Attempts per invocation, including the first one
    pub const DEFAULT_MAX_RETRIES: u32 = 100;

    /// Pause between attempts in milliseconds
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

    /// Pause before each booking submission within a batch in milliseconds
    pub const DEFAULT_BOOKING_GAP_MS: u64 = 200;

    /// Upper bound for the retry delay and booking gap in seconds
    pub const MAX_WAIT_SECONDS: f64 = 86_400.0;
}

/// Daily scheduler timing
pub mod schedule {
    /// How often the trigger condition is checked
    pub const TICK_MS: u64 = 1000;
}

/// Fragments of remote `message` values with known meaning
pub mod remote_messages {
    /// "Authentication failed"
    pub const AUTH_FAILURE: &str = "认证失败";

    /// "Booking time slot must not be empty", sent when the record is missing fields
    pub const EMPTY_BOOKING_SLOT: &str = "预约时间段不能为空";

    /// "Not within the open date range"
    pub const OUTSIDE_BOOKING_WINDOW: &str = "不在开放日期范围内";
}

/// Default preferences used when none are given on the command line
pub mod preferences {
    pub const DEFAULT_COURT: &str = "场地1";
    pub const DEFAULT_TIME: &str = "10:00";
}

/// Environment variable names
pub mod env_vars {
    /// Override for the remote base URL
    pub const BASE_URL: &str = "COURT_BOOKER_BASE_URL";

    /// Session token sent as the `token` cookie
    pub const TOKEN: &str = "COURT_BOOKER_TOKEN";

    /// Override for the default event id
    pub const EVENT_ID: &str = "COURT_BOOKER_EVENT_ID";

    /// Override for the log file path
    pub const LOG_FILE: &str = "COURT_BOOKER_LOG_FILE";

    /// Override for both request timeouts in seconds
    pub const HTTP_TIMEOUT: &str = "COURT_BOOKER_HTTP_TIMEOUT";
}
