//! Elite 2 flash log decoding
//!
//! The flash log holds the last recorded night in one blob, so a single
//! command replaces the date/alarm/events round trips.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use sleeptracker_core::{ProtocolError, SleepSession};
use sleeptracker_session::{read_word_le, require_len};

/// Byte positions inside the flash log
pub mod layout {
    pub const MONTH: usize = 6;
    pub const DAY: usize = 7;
    pub const YEAR: usize = 8;
    pub const MINUTES_TO_ALARM: usize = 10;
    pub const WINDOW: usize = 16;
    pub const BEDTIME_HOUR: usize = 22;
    pub const BEDTIME_MINUTE: usize = 23;
    pub const BEDTIME_SECOND: usize = 24;
    pub const COUNT: usize = 25;
    /// Wake moments, one little-endian word of seconds after bedtime each
    pub const MOMENTS: usize = 26;
    pub const MOMENT_LEN: usize = 2;
    pub const HEADER_LEN: usize = MOMENTS;
}

/// Decode a flash log blob into a session
///
/// The alarm is bedtime plus the minutes-to-alarm field and each wake
/// moment is bedtime plus its offset; both wrap past midnight. Moments
/// announced by the count but missing from the blob are dropped.
pub fn parse_flash_log(data: &[u8]) -> Result<SleepSession, ProtocolError> {
    require_len(data, layout::HEADER_LEN)?;

    let month = data[layout::MONTH];
    let day = data[layout::DAY];
    let year = read_word_le(data, layout::YEAR);
    let date = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into()).ok_or_else(|| {
        ProtocolError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day))
    })?;

    let (hour, minute, second) = (
        data[layout::BEDTIME_HOUR],
        data[layout::BEDTIME_MINUTE],
        data[layout::BEDTIME_SECOND],
    );
    let bedtime = NaiveTime::from_hms_opt(hour.into(), minute.into(), second.into())
        .ok_or_else(|| {
            ProtocolError::InvalidTime(format!("bedtime {:02}:{:02}:{:02}", hour, minute, second))
        })?;

    let minutes_to_alarm = read_word_le(data, layout::MINUTES_TO_ALARM);
    let alarm = bedtime + TimeDelta::minutes(minutes_to_alarm.into());
    let window = read_word_le(data, layout::WINDOW);

    let count = usize::from(data[layout::COUNT]);
    let moments = (0..count)
        .map(|i| layout::MOMENTS + i * layout::MOMENT_LEN)
        .take_while(|offset| offset + 1 < data.len())
        .map(|offset| bedtime + TimeDelta::seconds(read_word_le(data, offset).into()))
        .collect();

    Ok(SleepSession::new(
        Some(date),
        Some(alarm),
        window,
        Some(bedtime),
        moments,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    /// Header for 2013-03-09, to bed 23:30:00, alarm 450 min later, window 20
    fn header() -> Vec<u8> {
        let mut data = vec![0u8; layout::HEADER_LEN];
        data[layout::MONTH] = 3;
        data[layout::DAY] = 9;
        data[layout::YEAR..layout::YEAR + 2].copy_from_slice(&2013u16.to_le_bytes());
        data[layout::MINUTES_TO_ALARM..layout::MINUTES_TO_ALARM + 2]
            .copy_from_slice(&450u16.to_le_bytes());
        data[layout::WINDOW..layout::WINDOW + 2].copy_from_slice(&20u16.to_le_bytes());
        data[layout::BEDTIME_HOUR] = 23;
        data[layout::BEDTIME_MINUTE] = 30;
        data[layout::BEDTIME_SECOND] = 0;
        data
    }

    fn with_moments(offsets: &[u16]) -> Vec<u8> {
        let mut data = header();
        data[layout::COUNT] = offsets.len() as u8;
        for offset in offsets {
            data.extend_from_slice(&offset.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_flash_log() {
        let data = with_moments(&[600, 3600, 14_400]);
        let session = parse_flash_log(&data).unwrap();

        assert_eq!(session.date(), NaiveDate::from_ymd_opt(2013, 3, 9));
        assert_eq!(session.bedtime(), Some(hms(23, 30, 0)));
        assert_eq!(session.alarm(), Some(hms(7, 0, 0)));
        assert_eq!(session.window_minutes(), 20);
        assert_eq!(
            session.moments(),
            &[hms(23, 40, 0), hms(0, 30, 0), hms(3, 30, 0)]
        );
    }

    #[test]
    fn test_missing_moments_are_dropped() {
        let mut data = with_moments(&[600, 1200]);
        data[layout::COUNT] = 5;
        // A lone byte cannot hold a moment
        data.push(0x10);
        let session = parse_flash_log(&data).unwrap();
        assert_eq!(session.moments().len(), 2);
    }

    #[test]
    fn test_short_log() {
        assert_eq!(
            parse_flash_log(&[0u8; 25]),
            Err(ProtocolError::Truncated {
                needed: 26,
                available: 25
            })
        );
    }

    #[test]
    fn test_invalid_date() {
        let mut data = header();
        data[layout::MONTH] = 13;
        assert!(matches!(
            parse_flash_log(&data),
            Err(ProtocolError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_invalid_bedtime() {
        let mut data = header();
        data[layout::BEDTIME_MINUTE] = 60;
        assert!(matches!(
            parse_flash_log(&data),
            Err(ProtocolError::InvalidTime(_))
        ));
    }
}
