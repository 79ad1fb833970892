//! Byte positions inside each response's data
//!
//! Offsets are relative to the data that follows the size prefix.

/// `readDate`: day, month, little-endian year
pub mod date {
    pub const DAY: usize = 0;
    pub const MONTH: usize = 1;
    pub const YEAR: usize = 2;
    pub const LEN: usize = 4;

    /// Years outside this range are replaced by the reference year
    pub const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;
}

/// `readTime`: seconds, minutes, hours
pub mod time {
    pub const SECOND: usize = 0;
    pub const MINUTE: usize = 1;
    pub const HOUR: usize = 2;
    pub const LEN: usize = 3;
}

/// `readAlarm`
pub mod alarm {
    pub const WINDOW: usize = 0;
    pub const ALARM_MINUTE: usize = 2;
    pub const ALARM_HOUR: usize = 6;
    pub const BEDTIME_HOUR: usize = 12;
    pub const BEDTIME_MINUTE: usize = 13;
    pub const LEN: usize = 14;
}

/// `readEvents`: header followed by `COUNT` records of hour, minute, second
pub mod events {
    pub const SECONDS_TO_ALARM: usize = 0;
    pub const COUNT: usize = 2;
    pub const RECORDS: usize = 3;
    pub const RECORD_LEN: usize = 3;
    pub const LEN: usize = 3;
}

/// `readFlashLog`: this much data or less means no log
pub const FLASH_LOG_MIN_DATA: usize = 2;
