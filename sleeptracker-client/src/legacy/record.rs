//! Sleeptracker Pro record layout and decoder
//!
//! After the handshake the watch dumps one record:
//!
//! ```text
//! echo(1) date(2) pad(1) window(1) bedtime(2) alarm(2) count(1)
//! count * (moment(2) pad(1)) minutes(2, LE) checksum(1) ending(1)
//! ```
//!
//! The checksum is the low byte of the sum of everything before it,
//! starting with the echoed handshake.

use super::cursor::DecodeCursor;
use chrono::{NaiveDate, NaiveTime};
use sleeptracker_core::{ProtocolError, SleepSession};
use sleeptracker_transport::HANDSHAKE;

/// Marker closing every record
pub const RECORD_ENDING: [u8; 1] = [0x20];

/// A decoded legacy record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
    pub session: SleepSession,
    /// Minutes from bedtime to the last wake moment, as the watch computed it
    pub total_minutes: u16,
    pub checksum: u8,
    /// Bytes the record occupied in the input
    pub length: usize,
}

impl LegacyRecord {
    pub fn into_session(self) -> SleepSession {
        self.session
    }
}

/// True for a capture of zeros, with or without the echo in front
///
/// A watch with an empty memory answers the handshake this way.
fn is_blank(data: &[u8]) -> bool {
    let body = match data {
        [HANDSHAKE, rest @ ..] => rest,
        _ => data,
    };
    !body.is_empty() && body.iter().all(|&b| b == 0)
}

/// Packed date: month, day; the year is not stored
fn packed_date([month, day]: [u8; 2], year: i32) -> Result<NaiveDate, ProtocolError> {
    NaiveDate::from_ymd_opt(year, month.into(), day.into())
        .ok_or_else(|| ProtocolError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day)))
}

/// Packed time of day: hour, minute
fn packed_time([hour, minute]: [u8; 2]) -> Result<NaiveTime, ProtocolError> {
    NaiveTime::from_hms_opt(hour.into(), minute.into(), 0)
        .ok_or_else(|| ProtocolError::InvalidTime(format!("{:02}:{:02}", hour, minute)))
}

/// Decode one record
///
/// `reference_year` completes the date, the watch only stores day and month.
/// Integrity comes first: a corrupted byte is reported as a checksum or
/// ending failure before any field is interpreted.
pub fn decode_record(data: &[u8], reference_year: i32) -> Result<LegacyRecord, ProtocolError> {
    if is_blank(data) {
        return Err(ProtocolError::NoData);
    }

    let cursor = DecodeCursor::new(data);
    let (cursor, echo) = cursor.byte()?;
    let (cursor, date) = cursor.pair()?;
    let cursor = cursor.skip(1)?;
    let (cursor, window) = cursor.byte()?;
    let (cursor, bedtime) = cursor.pair()?;
    let (cursor, alarm) = cursor.pair()?;
    let (mut cursor, count) = cursor.byte()?;

    let mut moments = Vec::with_capacity(count.into());
    for _ in 0..count {
        let (next, moment) = cursor.pair()?;
        cursor = next.skip(1)?;
        moments.push(moment);
    }

    let (cursor, total_minutes) = cursor.word_le()?;
    let (cursor, checksum) = cursor.checksum()?;
    let length = cursor.finish(&RECORD_ENDING)?;

    if echo != HANDSHAKE {
        return Err(ProtocolError::UnexpectedEcho(echo));
    }
    let moments = moments
        .into_iter()
        .map(packed_time)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LegacyRecord {
        session: SleepSession::new(
            Some(packed_date(date, reference_year)?),
            Some(packed_time(alarm)?),
            window.into(),
            Some(packed_time(bedtime)?),
            moments,
        ),
        total_minutes,
        checksum,
        length,
    })
}
