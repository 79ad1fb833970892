//! Transport over any async byte stream
//!
//! Lets the polling session run over something other than a serial port,
//! e.g. a TCP serial bridge or a scripted stream in tests.

use crate::stream::StreamAccessor;
use async_trait::async_trait;
use sleeptracker_core::{TrackerError, TrackerResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Stream accessor wrapping an `AsyncRead + AsyncWrite` value
///
/// A failed read drops the wrapped stream, the same way a serial line is
/// released.
#[derive(Debug)]
pub struct IoTransport<T> {
    inner: Option<T>,
}

impl<T> IoTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Give back the wrapped stream, if not closed yet
    pub fn into_inner(self) -> Option<T> {
        self.inner
    }

    fn inner_mut(&mut self) -> TrackerResult<&mut T> {
        self.inner.as_mut().ok_or_else(|| {
            TrackerError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Stream closed",
            ))
        })
    }
}

#[async_trait]
impl<T> StreamAccessor for IoTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> TrackerResult<usize> {
        let inner = self.inner_mut()?;
        match inner.read(buf).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.inner = None;
                Err(TrackerError::Connection(e))
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> TrackerResult<usize> {
        let inner = self.inner_mut()?;
        inner.write(buf).await.map_err(TrackerError::Connection)
    }

    async fn flush(&mut self) -> TrackerResult<()> {
        let inner = self.inner_mut()?;
        inner.flush().await.map_err(TrackerError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    async fn close(&mut self) -> TrackerResult<()> {
        if let Some(mut inner) = self.inner.take() {
            let _ = inner.shutdown().await;
        }
        Ok(())
    }
}
