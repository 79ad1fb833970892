//! Per-model decode strategies of the framed family

use crate::flash::parse_flash_log;
use crate::protocol::FramedProtocol;
use sleeptracker_core::{ProtocolError, SharedSink, SleepSession, TrackerError, TrackerResult};
use sleeptracker_transport::TransportSession;

/// Smart-alarm window the watch ships with
pub const DEFAULT_WINDOW_MINUTES: u16 = 20;

/// Failures of one field that leave the rest of the night usable
///
/// Frame and line failures are not among them: they end the attempt.
fn is_field_failure(error: &TrackerError) -> bool {
    matches!(
        error.protocol(),
        Some(
            ProtocolError::Timeout
                | ProtocolError::Truncated { .. }
                | ProtocolError::InvalidDate(_)
                | ProtocolError::InvalidTime(_)
                | ProtocolError::NoData
        )
    )
}

fn optional<T>(sink: &SharedSink, field: &str, result: TrackerResult<T>) -> TrackerResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if is_field_failure(&e) => {
            log::warn!("{} failed, continuing without it: {}", field, e);
            sink.trace(&format!("{} failed: {}", field, e));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Reads kept for the trace only
///
/// Field failures are traced and dropped; a broken frame or line still
/// ends the attempt.
fn trace_only<T>(sink: &SharedSink, field: &str, result: TrackerResult<T>) -> TrackerResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if is_field_failure(&e) => {
            sink.trace(&format!("{} failed: {}", field, e));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Assemble a night from a framed watch
///
/// With `try_flash_log` the flash log is read first; if the watch has none
/// or it does not decode, the night is put together from the date, alarm
/// and events commands instead.
pub async fn read_framed(
    session: &mut TransportSession,
    reference_year: i32,
    try_flash_log: bool,
) -> TrackerResult<SleepSession> {
    let sink = session.sink().clone();
    session.discard_input().await?;

    if try_flash_log {
        let flash = FramedProtocol::new(session, reference_year)
            .read_flash_log()
            .await;
        match flash {
            Ok(Some(blob)) => match parse_flash_log(&blob) {
                Ok(night) => {
                    sink.trace(&format!("Flash log: {}", night));
                    return Ok(night);
                }
                Err(e) => sink.trace(&format!("Flash log unreadable: {}", e)),
            },
            Ok(None) => {}
            Err(e) if e.is_io() => return Err(e),
            Err(e) => sink.trace(&format!("readFlashLog failed: {}", e)),
        }
        log::info!("Falling back to per-field commands on {}", session.port_name());
        sink.trace("Falling back to per-field commands");
        session.discard_input().await?;
    }

    let mut protocol = FramedProtocol::new(session, reference_year);
    let date = protocol.read_date().await?;
    trace_only(&sink, "readTime", protocol.read_time().await)?;
    let alarm = optional(&sink, "readAlarm", protocol.read_alarm().await)?;
    let moments = optional(&sink, "readEvents", protocol.read_events().await)?.unwrap_or_default();
    trace_only(&sink, "readDeviceName", protocol.read_device_name().await)?;

    let night = match alarm {
        Some(settings) => SleepSession::new(
            Some(date),
            Some(settings.alarm),
            settings.window_minutes,
            settings.bedtime,
            moments,
        ),
        None => SleepSession::new(Some(date), None, DEFAULT_WINDOW_MINUTES, None, moments),
    };
    sink.trace(&format!("Assembled: {}", night));
    Ok(night)
}
