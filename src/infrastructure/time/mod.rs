mod sntp_time_source;
mod system_time_source;

pub use sntp_time_source::{DEFAULT_NTP_SERVER, SntpError, SntpTimeSource, parse_transmit_timestamp};
pub use system_time_source::SystemTimeSource;
