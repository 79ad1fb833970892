//! Session assembler
//!
//! Picks the decode strategy for the configured model and runs it against
//! one named port, or against every candidate port until one yields a
//! night. Each attempt owns its line for its whole duration and releases it
//! before the next attempt starts.

use super::builder::AcquisitionBuilder;
use super::ports::PortProvider;
use super::strategy::read_framed;
use crate::legacy::read_legacy_record;
use sleeptracker_core::{SharedSink, SleepSession, TrackerResult, WatchModel};
use sleeptracker_transport::{PollSettings, SerialSettings, TransportSession};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A configured acquisition, see [`AcquisitionBuilder`]
pub struct Acquisition {
    pub(super) model: WatchModel,
    pub(super) port: Option<String>,
    pub(super) baud_rate: u32,
    pub(super) reference_year: i32,
    pub(super) poll_settings: PollSettings,
    pub(super) sink: SharedSink,
    pub(super) cancel_flag: Option<Arc<AtomicBool>>,
    pub(super) provider: Arc<dyn PortProvider>,
}

impl Acquisition {
    pub fn builder() -> AcquisitionBuilder {
        AcquisitionBuilder::new()
    }

    pub fn model(&self) -> WatchModel {
        self.model
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Read one night from the watch
    ///
    /// With a named port every failure is returned. Without one, candidate
    /// ports are tried in order and `Ok(None)` means none of them yielded a
    /// night, or the acquisition was cancelled.
    pub async fn acquire(&self) -> TrackerResult<Option<SleepSession>> {
        match &self.port {
            Some(port) => {
                if self.is_cancelled() {
                    return Ok(None);
                }
                self.acquire_from(port).await.map(Some)
            }
            None => self.scan().await,
        }
    }

    /// One attempt on one port
    pub async fn acquire_from(&self, port: &str) -> TrackerResult<SleepSession> {
        let serial =
            SerialSettings::with_timeout(port, self.baud_rate, self.poll_settings.read_timeout);
        log::info!("Reading {} on {}", self.model.display_name(), serial);
        self.sink.trace(&format!("Opening port {}...", serial));

        let stream = self.provider.open(&serial).await?;
        self.sink.trace("Port opened.");
        let mut session =
            TransportSession::new(port, stream, self.poll_settings, self.sink.clone());

        let outcome = self.run_strategy(&mut session).await;
        if let Err(e) = session.close().await {
            log::warn!("Closing {} failed: {}", port, e);
        }
        outcome
    }

    async fn run_strategy(&self, session: &mut TransportSession) -> TrackerResult<SleepSession> {
        match self.model {
            WatchModel::Legacy => read_legacy_record(session, self.reference_year)
                .await
                .map(|record| record.into_session()),
            WatchModel::Framed | WatchModel::FramedFlashLog => {
                read_framed(session, self.reference_year, self.model.has_flash_log()).await
            }
        }
    }

    async fn scan(&self) -> TrackerResult<Option<SleepSession>> {
        let ports = match self.provider.candidate_ports() {
            Ok(ports) => ports,
            Err(e) => {
                log::warn!("Port enumeration failed: {}", e);
                self.sink.trace(&format!("Port enumeration failed: {}", e));
                return Ok(None);
            }
        };
        if ports.is_empty() {
            self.sink.trace("No serial ports found");
            return Ok(None);
        }

        for port in &ports {
            if self.is_cancelled() {
                self.sink.trace("Acquisition cancelled");
                return Ok(None);
            }
            match self.acquire_from(port).await {
                Ok(night) => return Ok(Some(night)),
                Err(e) if e.is_io() => {
                    log::warn!("Skipping {}: {}", port, e);
                    self.sink.trace(&format!("Skipping {}: {}", port, e));
                }
                Err(e) => {
                    log::warn!("No session from {}: {}", port, e);
                    self.sink.trace(&format!("No session from {}: {}", port, e));
                }
            }
        }

        self.sink
            .trace(&format!("No watch answered on {} ports", ports.len()));
        Ok(None)
    }
}
