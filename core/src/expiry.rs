// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human readable timestamps for "visible until" subtitles.

use chrono::{DateTime, Datelike, FixedOffset, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Clock and calendar preferences for timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeFormat {
    /// 24-hour clock ("17:05") instead of 12-hour ("5:05 PM")
    pub use_24_hour: bool,
    /// Offset from UTC applied before formatting
    pub utc_offset_secs: i32,
}

impl Default for DateTimeFormat {
    fn default() -> Self {
        Self {
            use_24_hour: true,
            utc_offset_secs: 0,
        }
    }
}

impl DateTimeFormat {
    fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }

    fn local(&self, timestamp: i64) -> Option<DateTime<FixedOffset>> {
        Utc.timestamp_opt(timestamp, 0)
            .single()
            .map(|t| t.with_timezone(&self.offset()))
    }

    fn time_of_day(&self, time: &DateTime<FixedOffset>) -> String {
        if self.use_24_hour {
            time.format("%H:%M").to_string()
        } else {
            time.format("%-I:%M %p").to_string()
        }
    }

    /// Timestamp relative to `now`: time only on the same day, month and day
    /// within the same year, full date otherwise.
    pub fn human_readable(&self, timestamp: i32, now: i64) -> String {
        let (Some(time), Some(now)) = (self.local(i64::from(timestamp)), self.local(now)) else {
            return timestamp.to_string();
        };
        let clock = self.time_of_day(&time);
        if time.date_naive() == now.date_naive() {
            clock
        } else if time.year() == now.year() {
            format!("{}, {}", time.format("%b %-d"), clock)
        } else {
            format!("{}, {}", time.format("%b %-d, %Y"), clock)
        }
    }
}
