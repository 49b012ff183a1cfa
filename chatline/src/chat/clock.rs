use chrono::{DateTime, FixedOffset, Offset as _, Timelike as _, Utc};

use crate::models::Timestamp;

/// Shown in place of a missing or malformed timestamp.
pub const INVALID_TIME: &str = "Invalid time";

/// Zone that server timestamps are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallClock {
    /// System zone. The offset is looked up for every instant, so daylight
    /// saving changes apply to older messages too.
    Local,
    Fixed(FixedOffset),
}

impl WallClock {
    pub fn localize(&self, datetime: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            WallClock::Local => {
                let local = datetime.with_timezone(&chrono::Local);
                local.with_timezone(&local.offset().fix())
            }
            WallClock::Fixed(offset) => datetime.with_timezone(offset),
        }
    }
}

impl From<FixedOffset> for WallClock {
    fn from(offset: FixedOffset) -> Self {
        WallClock::Fixed(offset)
    }
}

/// Format a server timestamp as 12-hour wall-clock text (`h:mm AM/PM`).
pub fn format_clock(time: Option<Timestamp>, clock: &WallClock) -> String {
    let Some(time) = time else {
        tracing::warn!("Message missing time");
        return INVALID_TIME.to_string();
    };
    match time.to_utc() {
        Some(datetime) => {
            let local = clock.localize(datetime);
            format_hour_minute(local.hour(), local.minute())
        }
        None => {
            tracing::warn!(micros = time.micros(), "Message time out of range");
            INVALID_TIME.to_string()
        }
    }
}

pub(crate) fn format_hour_minute(hour: u32, minute: u32) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", hour, minute, suffix)
}
