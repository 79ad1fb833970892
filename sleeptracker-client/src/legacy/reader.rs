//! Reading a record from a Sleeptracker Pro
//!
//! The legacy watch does not take commands: it answers the handshake byte
//! by dumping its record and then falls silent.

use super::record::{decode_record, LegacyRecord};
use sleeptracker_core::diagnostics::byte_lines;
use sleeptracker_core::{hex_dump, TrackerResult};
use sleeptracker_transport::{TransportSession, HANDSHAKE};

/// Where the record starts in a capture
///
/// Some adapters deliver noise before the echoed handshake; everything in
/// front of the first echo is dropped.
pub fn locate_record(raw: &[u8]) -> Option<usize> {
    raw.iter().position(|&b| b == HANDSHAKE)
}

/// Wake the watch, read until it goes quiet and decode what it sent
pub async fn read_legacy_record(
    session: &mut TransportSession,
    reference_year: i32,
) -> TrackerResult<LegacyRecord> {
    session.handshake().await?;
    let raw = session.read_until_idle().await?;

    let sink = session.sink().clone();
    sink.trace(&format!("Raw data ({} bytes): {}", raw.len(), hex_dump(&raw)));
    for line in byte_lines(&raw) {
        sink.trace(&line);
    }

    let record = match locate_record(&raw) {
        Some(0) => &raw[..],
        Some(offset) => {
            sink.trace(&format!(
                "Handshake echo at offset {}, skipping {} bytes",
                offset, offset
            ));
            &raw[offset..]
        }
        None => {
            sink.trace("WARNING: no handshake echo in the capture");
            &raw[..]
        }
    };

    let decoded = decode_record(record, reference_year)?;
    sink.trace(&format!(
        "Decoded: {}, total {} min, checksum 0x{:02X}",
        decoded.session, decoded.total_minutes, decoded.checksum
    ));
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::record::tests::NIGHT;
    use sleeptracker_core::{MemorySink, ProtocolError, TrackerError};
    use sleeptracker_transport::{IoTransport, PollSettings};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::io::Builder;

    fn open_mock(mock: tokio_test::io::Mock, sink: Arc<MemorySink>) -> TransportSession {
        TransportSession::new(
            "mock",
            Box::new(IoTransport::new(mock)),
            PollSettings::default(),
            sink,
        )
    }

    #[test]
    fn test_locate_record() {
        assert_eq!(locate_record(&[0x56, 0x06]), Some(0));
        assert_eq!(locate_record(&[0xFF, 0x00, 0x56, 0x06]), Some(2));
        assert_eq!(locate_record(&[0x00, 0x00]), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trickled_record() {
        let mock = Builder::new()
            .write(&[HANDSHAKE])
            .read(&NIGHT[..7])
            .wait(Duration::from_millis(400))
            .read(&NIGHT[7..30])
            .wait(Duration::from_millis(400))
            .read(&NIGHT[30..])
            .build();
        let sink = Arc::new(MemorySink::new());
        let mut session = open_mock(mock, sink.clone());

        let record = read_legacy_record(&mut session, 2009).await.unwrap();
        assert_eq!(record.session.moments().len(), 13);
        assert_eq!(record.total_minutes, 444);
        assert!(sink.contains("Packets: 3, 53 bytes"));
        assert!(sink.contains("[  0] 0x56  dec= 86  char='V'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_noise_before_echo() {
        let mut capture = vec![0xFF, 0xFE];
        capture.extend_from_slice(&NIGHT);
        let mock = Builder::new().write(&[HANDSHAKE]).read(&capture).build();
        let sink = Arc::new(MemorySink::new());
        let mut session = open_mock(mock, sink.clone());

        let record = read_legacy_record(&mut session, 2009).await.unwrap();
        assert_eq!(record.session.window_minutes(), 30);
        assert!(sink.contains("skipping 2 bytes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_watch() {
        let mock = Builder::new().write(&[HANDSHAKE]).build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let err = read_legacy_record(&mut session, 2009).await.unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(ProtocolError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_watch() {
        let mock = Builder::new().write(&[HANDSHAKE]).read(&[0u8; 40]).build();
        let mut session = open_mock(mock, Arc::new(MemorySink::new()));

        let err = read_legacy_record(&mut session, 2009).await.unwrap_err();
        assert!(matches!(err, TrackerError::Protocol(ProtocolError::NoData)));
    }
}
