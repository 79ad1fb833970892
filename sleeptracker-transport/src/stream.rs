//! Byte-level access to the line a watch is attached to

use async_trait::async_trait;
use sleeptracker_core::{TrackerError, TrackerResult};

/// A duplex byte line to a watch
///
/// Implementations do no buffering of their own beyond what the OS does;
/// the polling session above decides how long to wait for bytes.
#[async_trait]
pub trait StreamAccessor: Send {
    /// Read whatever is buffered into `buf`
    ///
    /// Waits until at least one byte is available. `Ok(0)` means the line
    /// has nothing more to give.
    async fn read(&mut self, buf: &mut [u8]) -> TrackerResult<usize>;

    /// Write part of `buf`, returning how much was taken
    async fn write(&mut self, buf: &[u8]) -> TrackerResult<usize>;

    async fn write_all(&mut self, mut buf: &[u8]) -> TrackerResult<()> {
        while !buf.is_empty() {
            match self.write(buf).await? {
                0 => {
                    return Err(TrackerError::Connection(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "Line accepted no bytes",
                    )));
                }
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> TrackerResult<()>;

    /// Drive DTR and RTS
    ///
    /// Lines without modem control ignore this.
    async fn set_control_lines(&mut self, _dtr: bool, _rts: bool) -> TrackerResult<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool;

    /// Release the line; later reads and writes fail
    async fn close(&mut self) -> TrackerResult<()>;
}

/// A line that has to be claimed before use
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Claim the line; fails if it is missing or already taken
    async fn open(&mut self) -> TrackerResult<()>;
}
