use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const IST_OPEN_MINUTE: u32 = 9 * 60 + 15;
const IST_CLOSE_MINUTE: u32 = 15 * 60 + 30;

/// Derives whether the simulated exchange is open at a given instant.
/// The open flag is never stored; it is recomputed per event so the
/// engine and its snapshots can't drift from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketCalendar {
    /// Demo mode: every tick and every order is live.
    AlwaysOpen,
    /// Maintenance mode: nothing ticks, market orders are rejected.
    AlwaysClosed,
    /// NSE equity hours: 09:15-15:30 IST, Monday through Friday.
    IstEquity,
}

impl MarketCalendar {
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        match self {
            MarketCalendar::AlwaysOpen => true,
            MarketCalendar::AlwaysClosed => false,
            MarketCalendar::IstEquity => {
                let offset =
                    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range");
                let ist = at.with_timezone(&offset);
                if matches!(ist.weekday(), Weekday::Sat | Weekday::Sun) {
                    return false;
                }
                let minute_of_day = ist.hour() * 60 + ist.minute();
                (IST_OPEN_MINUTE..=IST_CLOSE_MINUTE).contains(&minute_of_day)
            }
        }
    }
}
