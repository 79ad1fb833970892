//! Command/response accessors of the framed watches
//!
//! Every accessor sends one request frame, collects the response, checks
//! its delimiters, unstuffs it and interprets the data behind the size
//! prefix. Decoding of the data is kept in free functions so it can be
//! exercised without a line.

use super::command::Command;
use super::layout::{alarm, date, events, time, FLASH_LOG_MIN_DATA};
use chrono::{NaiveDate, NaiveTime};
use sleeptracker_core::{hex_dump, ProtocolError, TrackerError, TrackerResult};
use sleeptracker_session::{ends_frame, read_word_le, require_len, RawFrame, FRAME_TRAILER};
use sleeptracker_transport::TransportSession;

/// Alarm configuration reported by `readAlarm`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSettings {
    pub alarm: NaiveTime,
    pub window_minutes: u16,
    /// `None` when the watch reports no plausible bedtime
    pub bedtime: Option<NaiveTime>,
}

/// Wake events reported by `readEvents`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeEvents {
    pub seconds_to_alarm: u16,
    pub moments: Vec<NaiveTime>,
}

/// Decode `readDate` data
///
/// A year outside 2000..=2100 is replaced by `reference_year`.
pub fn decode_date(data: &[u8], reference_year: i32) -> Result<NaiveDate, ProtocolError> {
    require_len(data, date::LEN)?;
    let day = u32::from(data[date::DAY]);
    let month = u32::from(data[date::MONTH]);
    let mut year = i32::from(read_word_le(data, date::YEAR));
    if !date::PLAUSIBLE_YEARS.contains(&year) {
        year = reference_year;
    }

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(ProtocolError::InvalidDate(format!(
            "day={} month={}",
            day, month
        )));
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ProtocolError::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day))
    })
}

/// Decode `readTime` data
pub fn decode_time(data: &[u8]) -> Result<NaiveTime, ProtocolError> {
    require_len(data, time::LEN)?;
    let (hour, minute, second) = (data[time::HOUR], data[time::MINUTE], data[time::SECOND]);
    NaiveTime::from_hms_opt(hour.into(), minute.into(), second.into()).ok_or_else(|| {
        ProtocolError::InvalidTime(format!("{:02}:{:02}:{:02}", hour, minute, second))
    })
}

/// Decode `readAlarm` data
pub fn decode_alarm(data: &[u8]) -> Result<AlarmSettings, ProtocolError> {
    require_len(data, alarm::LEN)?;
    let (hour, minute) = (data[alarm::ALARM_HOUR], data[alarm::ALARM_MINUTE]);
    let alarm_time = NaiveTime::from_hms_opt(hour.into(), minute.into(), 0)
        .ok_or_else(|| ProtocolError::InvalidTime(format!("alarm {:02}:{:02}", hour, minute)))?;

    let bedtime = NaiveTime::from_hms_opt(
        data[alarm::BEDTIME_HOUR].into(),
        data[alarm::BEDTIME_MINUTE].into(),
        0,
    );

    Ok(AlarmSettings {
        alarm: alarm_time,
        window_minutes: data[alarm::WINDOW].into(),
        bedtime,
    })
}

/// Decode `readEvents` data
///
/// Records cut short by the end of the data end the list. Records with an
/// impossible time of day are dropped.
pub fn decode_events(data: &[u8]) -> Result<WakeEvents, ProtocolError> {
    require_len(data, events::LEN)?;
    let seconds_to_alarm = read_word_le(data, events::SECONDS_TO_ALARM);
    let count = usize::from(data[events::COUNT]);

    let moments = (0..count)
        .map(|i| events::RECORDS + i * events::RECORD_LEN)
        .take_while(|offset| offset + 2 < data.len())
        .filter_map(|offset| {
            NaiveTime::from_hms_opt(
                data[offset].into(),
                data[offset + 1].into(),
                data[offset + 2].into(),
            )
        })
        .collect();

    Ok(WakeEvents {
        seconds_to_alarm,
        moments,
    })
}

/// Decode `readDeviceName` data, dropping the zero padding
pub fn decode_device_name(data: &[u8]) -> String {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Command/response protocol over an open session
pub struct FramedProtocol<'a> {
    session: &'a mut TransportSession,
    reference_year: i32,
}

impl<'a> FramedProtocol<'a> {
    pub fn new(session: &'a mut TransportSession, reference_year: i32) -> Self {
        Self {
            session,
            reference_year,
        }
    }

    fn trace(&self, line: &str) {
        self.session.sink().trace(line);
    }

    pub async fn read_date(&mut self) -> TrackerResult<NaiveDate> {
        let data = self.send_command(Command::Date).await?;
        let date = decode_date(&data, self.reference_year)?;
        self.trace(&format!("Date: {}", date));
        Ok(date)
    }

    pub async fn read_time(&mut self) -> TrackerResult<NaiveTime> {
        let data = self.send_command(Command::Time).await?;
        let time = decode_time(&data)?;
        self.trace(&format!("Time: {}", time));
        Ok(time)
    }

    pub async fn read_alarm(&mut self) -> TrackerResult<AlarmSettings> {
        let data = self.send_command(Command::Alarm).await?;
        let settings = decode_alarm(&data)?;
        match settings.bedtime {
            Some(bedtime) => self.trace(&format!(
                "Alarm: {}, window: {} min, to bed: {}",
                settings.alarm, settings.window_minutes, bedtime
            )),
            None => self.trace(&format!(
                "Alarm: {}, window: {} min, to bed: not set",
                settings.alarm, settings.window_minutes
            )),
        }
        Ok(settings)
    }

    pub async fn read_events(&mut self) -> TrackerResult<Vec<NaiveTime>> {
        let data = self.send_command(Command::Events).await?;
        let events = decode_events(&data)?;
        self.trace(&format!(
            "Events: {} moments, {} s to alarm",
            events.moments.len(),
            events.seconds_to_alarm
        ));
        Ok(events.moments)
    }

    /// Raw flash log, `None` when the watch has no log to give
    pub async fn read_flash_log(&mut self) -> TrackerResult<Option<Vec<u8>>> {
        let data = self.send_command(Command::FlashLog).await?;
        if data.len() <= FLASH_LOG_MIN_DATA {
            self.trace("Flash log not supported or empty");
            return Ok(None);
        }
        Ok(Some(data))
    }

    pub async fn read_device_name(&mut self) -> TrackerResult<String> {
        let data = self.send_command(Command::DeviceName).await?;
        let name = decode_device_name(&data);
        self.trace(&format!("Device name: {}", name));
        Ok(name)
    }

    /// Send one request and return the data behind the size prefix
    async fn send_command(&mut self, command: Command) -> TrackerResult<Vec<u8>> {
        self.trace(&format!("CMD: {}", command));
        self.session.write(&command.request()).await?;

        let raw = self.receive_frame(command).await?;
        // A trailer byte that arrived after the previous frame was parsed
        let start = raw.iter().position(|&b| b != FRAME_TRAILER).unwrap_or(raw.len());
        if start > 0 {
            self.trace(&format!("Skipping {} stale trailer bytes", start));
        }
        let raw = &raw[start..];
        self.trace(&format!("Raw frame ({}): {}", raw.len(), hex_dump(raw)));

        let frame = RawFrame::decode(raw)?;
        if frame.opcode().is_some_and(|op| op != command.opcode()) {
            self.trace(&format!("WARNING: {} echoed as {}", command, frame));
        }
        self.trace(&format!(
            "Full payload ({}): {}",
            frame.payload().len(),
            hex_dump(frame.payload())
        ));
        if let Some(size) = frame.declared_size() {
            self.trace(&format!("Size field: {}", size));
        }
        let data = frame.data().to_vec();
        self.trace(&format!("Data ({}): {}", data.len(), hex_dump(&data)));
        Ok(data)
    }

    async fn receive_frame(&mut self, command: Command) -> TrackerResult<Vec<u8>> {
        let mut raw = self.session.read_available(command.expected_len()).await?;
        if !ends_frame(&raw) {
            match self.session.read_until_frame_complete().await {
                Ok(rest) => raw.extend_from_slice(&rest),
                Err(TrackerError::Protocol(ProtocolError::Timeout)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleeptracker_core::MemorySink;
    use sleeptracker_session::encode_escapes;
    use sleeptracker_transport::{IoTransport, PollSettings};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::io::Builder;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    /// Response frame as a framed watch sends it
    fn response(opcode: u8, data: &[u8]) -> Vec<u8> {
        let mut payload = (data.len() as u16).to_le_bytes().to_vec();
        payload.extend_from_slice(data);
        let mut frame = vec![0xC0, opcode];
        frame.extend(encode_escapes(&payload));
        frame.extend([0xC0, 0x00]);
        frame
    }

    fn open_mock(mock: tokio_test::io::Mock, sink: Arc<MemorySink>) -> TransportSession {
        TransportSession::new(
            "mock",
            Box::new(IoTransport::new(mock)),
            PollSettings::default(),
            sink,
        )
    }

    #[test]
    fn test_decode_date() {
        let date = decode_date(&[0x0E, 0x06, 0xD9, 0x07], 2020).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2009, 6, 14).unwrap());
    }

    #[test]
    fn test_decode_date_implausible_year_uses_reference() {
        let date = decode_date(&[0x0E, 0x06, 0x00, 0x00], 2011).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2011, 6, 14).unwrap());
    }

    #[test]
    fn test_decode_date_invalid() {
        assert!(matches!(
            decode_date(&[0x0E, 0x0D, 0xD9, 0x07], 2020),
            Err(ProtocolError::InvalidDate(_))
        ));
        assert!(matches!(
            decode_date(&[0x00, 0x06, 0xD9, 0x07], 2020),
            Err(ProtocolError::InvalidDate(_))
        ));
        // February 30th passes the range check but is not a date
        assert!(matches!(
            decode_date(&[0x1E, 0x02, 0xD9, 0x07], 2020),
            Err(ProtocolError::InvalidDate(_))
        ));
        assert!(matches!(
            decode_date(&[0x0E, 0x06], 2020),
            Err(ProtocolError::Truncated { needed: 4, available: 2 })
        ));
    }

    #[test]
    fn test_decode_time() {
        assert_eq!(decode_time(&[0x1E, 0x0F, 0x08]).unwrap(), hms(8, 15, 30));
        assert!(matches!(
            decode_time(&[0x00, 0x00, 0x18]),
            Err(ProtocolError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_decode_alarm() {
        let mut data = [0u8; 14];
        data[alarm::WINDOW] = 30;
        data[alarm::ALARM_MINUTE] = 10;
        data[alarm::ALARM_HOUR] = 10;
        data[alarm::BEDTIME_HOUR] = 2;
        data[alarm::BEDTIME_MINUTE] = 16;

        let settings = decode_alarm(&data).unwrap();
        assert_eq!(settings.alarm, hms(10, 10, 0));
        assert_eq!(settings.window_minutes, 30);
        assert_eq!(settings.bedtime, Some(hms(2, 16, 0)));

        data[alarm::BEDTIME_HOUR] = 0xFF;
        assert_eq!(decode_alarm(&data).unwrap().bedtime, None);

        data[alarm::ALARM_HOUR] = 25;
        assert!(matches!(
            decode_alarm(&data),
            Err(ProtocolError::InvalidTime(_))
        ));
        assert!(matches!(
            decode_alarm(&data[..13]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_events() {
        let data = [
            0x58, 0x02, 0x03, // 600 s to alarm, 3 records
            0x02, 0x2A, 0x00, // 02:42:00
            0x19, 0x00, 0x00, // dropped
            0x03, 0x0F, 0x1E, // 03:15:30
        ];
        let events = decode_events(&data).unwrap();
        assert_eq!(events.seconds_to_alarm, 600);
        assert_eq!(events.moments, vec![hms(2, 42, 0), hms(3, 15, 30)]);
    }

    #[test]
    fn test_decode_events_stops_at_end_of_data() {
        let data = [0x00, 0x00, 0x05, 0x02, 0x2A, 0x00, 0x03, 0x0F];
        let events = decode_events(&data).unwrap();
        assert_eq!(events.moments, vec![hms(2, 42, 0)]);
        assert!(decode_events(&[0x00, 0x00]).is_err());
    }

    #[test]
    fn test_decode_device_name() {
        assert_eq!(decode_device_name(b"ELITE2\0\0\0"), "ELITE2");
        assert_eq!(decode_device_name(&[0, 0]), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_date_exchange() {
        let mock = Builder::new()
            .write(&[0xC0, 0x02, 0x00, 0xC0])
            .read(&response(0x02, &[0x0E, 0x06, 0xD9, 0x07]))
            .build();
        let sink = Arc::new(MemorySink::new());
        let mut session = open_mock(mock, sink.clone());

        let date = FramedProtocol::new(&mut session, 2020).read_date().await.unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2009, 6, 14).unwrap());
        assert!(sink.contains("CMD: readDate (0x02)"));
        assert!(sink.contains("Size field: 4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_completed_after_expected_length() {
        let mut name = b"SLEEPTRACKER".to_vec();
        name.resize(34, 0);
        let frame = response(0x07, &name);
        assert_eq!(frame.len(), 40);

        let mock = Builder::new()
            .write(&[0xC0, 0x07, 0x00, 0xC0])
            .read(&frame[..36])
            .wait(Duration::from_millis(300))
            .read(&frame[36..])
            .build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let name = FramedProtocol::new(&mut session, 2020)
            .read_device_name()
            .await
            .unwrap();
        assert_eq!(name, "SLEEPTRACKER");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_trailer_is_skipped() {
        let mut bytes = vec![0x00];
        bytes.extend(response(0x09, &[0x1E, 0x0F, 0x08]));
        let mock = Builder::new()
            .write(&[0xC0, 0x09, 0x00, 0xC0])
            .read(&bytes)
            .build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let time = FramedProtocol::new(&mut session, 2020).read_time().await.unwrap();
        assert_eq!(time, hms(8, 15, 30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response() {
        let mock = Builder::new()
            .write(&[0xC0, 0x02, 0x00, 0xC0])
            .read(&[0x55, 0x02, 0x04, 0x00, 0x0E, 0x06, 0xD9, 0x07, 0xC0, 0x00])
            .build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let err = FramedProtocol::new(&mut session, 2020)
            .read_date()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Protocol(ProtocolError::MalformedFrame(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_device_times_out() {
        let mock = Builder::new().write(&[0xC0, 0x04, 0x00, 0xC0]).build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let err = FramedProtocol::new(&mut session, 2020)
            .read_alarm()
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(ProtocolError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_log_not_supported() {
        let mock = Builder::new()
            .write(&[0xC0, 0x0A, 0x00, 0xC0])
            .read(&response(0x0A, &[]))
            .build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let log = FramedProtocol::new(&mut session, 2020)
            .read_flash_log()
            .await
            .unwrap();
        assert_eq!(log, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_events_exchange() {
        let mock = Builder::new()
            .write(&[0xC0, 0x05, 0x00, 0xC0])
            .read(&response(0x05, &[0x00, 0x00, 0x01, 0x05, 0x10, 0x00]))
            .build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let moments = FramedProtocol::new(&mut session, 2020)
            .read_events()
            .await
            .unwrap();
        assert_eq!(moments, vec![hms(5, 16, 0)]);
    }
}
