//! Polling session over one open line
//!
//! A [`TransportSession`] owns the line for the whole decode attempt. It
//! knows how long to wait and when to give up, but never interprets what
//! it reads. The timed polls here are the only places where an attempt
//! waits on the hardware.

use crate::stream::StreamAccessor;
use bytes::BytesMut;
use sleeptracker_core::{hex_dump, ProtocolError, SharedSink, TrackerResult};
use sleeptracker_session::ends_frame;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, timeout, Instant};

/// Byte the legacy watch waits for before it starts sending
pub const HANDSHAKE: u8 = 0x56;

const READ_CHUNK: usize = 256;

/// Timing of the polling loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait after the handshake before the first read
    pub settle_delay: Duration,
    /// Length of one poll while waiting for a response
    pub poll_interval: Duration,
    /// Number of polls before a response wait gives up
    pub max_polls: u32,
    /// Pause after an empty read while reading until idle
    pub idle_interval: Duration,
    /// Consecutive empty reads that end a read-until-idle
    pub idle_reads: u32,
    /// Semi-blocking timeout of a single read
    pub read_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            max_polls: 20,
            idle_interval: Duration::from_millis(200),
            idle_reads: 3,
            read_timeout: Duration::from_millis(2000),
        }
    }
}

impl PollSettings {
    /// Total time a response wait may take
    pub fn response_budget(&self) -> Duration {
        self.poll_interval * self.max_polls
    }
}

/// One open line and its line discipline
pub struct TransportSession {
    port_name: String,
    stream: Box<dyn StreamAccessor>,
    settings: PollSettings,
    sink: SharedSink,
}

impl TransportSession {
    /// Wrap an already open stream
    pub fn new(
        port_name: impl Into<String>,
        stream: Box<dyn StreamAccessor>,
        settings: PollSettings,
        sink: SharedSink,
    ) -> Self {
        Self {
            port_name: port_name.into(),
            stream,
            settings,
            sink,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    fn trace(&self, line: &str) {
        self.sink.trace(line);
    }

    /// Write bytes to the line
    pub async fn write(&mut self, bytes: &[u8]) -> TrackerResult<()> {
        self.trace(&format!("Sending: {}", hex_dump(bytes)));
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    /// Wake the legacy watch
    ///
    /// Asserts DTR, clears RTS, sends the handshake byte and waits for the
    /// device to prepare its record.
    pub async fn handshake(&mut self) -> TrackerResult<()> {
        self.stream.set_control_lines(true, false).await?;
        self.trace("DTR=on, RTS=off.");
        self.trace(&format!("Sending handshake (0x{:02X})...", HANDSHAKE));
        self.stream.write_all(&[HANDSHAKE]).await?;
        self.stream.flush().await?;
        sleep(self.settings.settle_delay).await;
        Ok(())
    }

    /// One read bounded by `wait`; 0 when nothing arrived in time
    async fn poll_read(&mut self, buf: &mut [u8], wait: Duration) -> TrackerResult<usize> {
        let started = Instant::now();
        match timeout(wait, self.stream.read(buf)).await {
            Err(_) => Ok(0),
            Ok(Ok(0)) => {
                // Nothing buffered; keep the poll cadence instead of spinning
                sleep_until(started + wait).await;
                Ok(0)
            }
            Ok(Ok(n)) => {
                self.trace(&format!("Received {} bytes: {}", n, hex_dump(&buf[..n])));
                Ok(n)
            }
            Ok(Err(e)) => Err(e),
        }
    }

    /// Poll until at least `expected_min` bytes arrived or the budget is spent
    ///
    /// Returns everything collected, [`ProtocolError::Timeout`] if nothing
    /// arrived at all.
    pub async fn read_available(&mut self, expected_min: usize) -> TrackerResult<Vec<u8>> {
        let mut collected = BytesMut::with_capacity(expected_min.max(READ_CHUNK));
        let mut chunk = [0u8; READ_CHUNK];
        let interval = self.settings.poll_interval;

        for _ in 0..self.settings.max_polls {
            if collected.len() >= expected_min {
                break;
            }
            let n = self.poll_read(&mut chunk, interval).await?;
            collected.extend_from_slice(&chunk[..n]);
        }
        self.drain_into(&mut collected).await?;

        if collected.is_empty() {
            self.trace("No response from device (timeout)");
            return Err(ProtocolError::Timeout.into());
        }
        Ok(collected.to_vec())
    }

    /// Poll until the collected bytes end a frame or the budget is spent
    ///
    /// Returns whatever arrived if the deadline passes with at least one
    /// byte, [`ProtocolError::Timeout`] otherwise.
    pub async fn read_until_frame_complete(&mut self) -> TrackerResult<Vec<u8>> {
        let mut collected = BytesMut::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        let interval = self.settings.poll_interval;

        for _ in 0..self.settings.max_polls {
            if ends_frame(&collected) {
                break;
            }
            let n = self.poll_read(&mut chunk, interval).await?;
            collected.extend_from_slice(&chunk[..n]);
        }

        if collected.is_empty() {
            self.trace("No response from device (timeout)");
            return Err(ProtocolError::Timeout.into());
        }
        if !ends_frame(&collected) {
            self.trace(&format!(
                "Frame incomplete after {:?}, {} bytes collected",
                self.settings.response_budget(),
                collected.len()
            ));
        }
        Ok(collected.to_vec())
    }

    /// Read until the line goes quiet
    ///
    /// Chunks are concatenated in arrival order. Ends after `idle_reads`
    /// consecutive empty reads.
    pub async fn read_until_idle(&mut self) -> TrackerResult<Vec<u8>> {
        let mut collected = BytesMut::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        let read_timeout = self.settings.read_timeout;
        let mut packets = 0u32;
        let mut empty_reads = 0u32;

        while empty_reads < self.settings.idle_reads {
            let n = self.poll_read(&mut chunk, read_timeout).await?;
            if n == 0 {
                empty_reads += 1;
                if packets == 0 && empty_reads >= self.settings.idle_reads {
                    break;
                }
                self.trace(&format!("Empty read #{}, waiting...", empty_reads));
                sleep(self.settings.idle_interval).await;
                continue;
            }
            empty_reads = 0;
            packets += 1;
            collected.extend_from_slice(&chunk[..n]);
        }

        if collected.is_empty() {
            self.trace("No response from device");
            return Err(ProtocolError::Timeout.into());
        }
        self.trace(&format!(
            "Read complete. Packets: {}, {} bytes",
            packets,
            collected.len()
        ));
        Ok(collected.to_vec())
    }

    /// Take whatever is already buffered without waiting
    async fn drain_into(&mut self, collected: &mut BytesMut) -> TrackerResult<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = match timeout(Duration::ZERO, self.stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(e),
                Err(_) => 0,
            };
            if n == 0 {
                return Ok(());
            }
            self.trace(&format!("Received {} bytes: {}", n, hex_dump(&chunk[..n])));
            collected.extend_from_slice(&chunk[..n]);
        }
    }

    /// Discard stale input left over by an earlier attempt
    ///
    /// Returns the number of bytes thrown away.
    pub async fn discard_input(&mut self) -> TrackerResult<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        let interval = self.settings.poll_interval;
        let mut discarded = 0;

        for _ in 0..self.settings.max_polls {
            let n = match timeout(interval, self.stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(e),
                Err(_) => 0,
            };
            if n == 0 {
                break;
            }
            discarded += n;
        }

        if discarded > 0 {
            self.trace(&format!("Discarded {} stale bytes", discarded));
        }
        Ok(discarded)
    }

    /// Release the line
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) -> TrackerResult<()> {
        if self.stream.is_closed() {
            return Ok(());
        }
        self.stream.close().await?;
        self.trace(&format!("Port {} closed.", self.port_name));
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_closed()
    }
}
