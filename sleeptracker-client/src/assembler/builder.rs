//! Acquisition builder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use sleeptracker_client::AcquisitionBuilder;
//! use sleeptracker_core::WatchModel;
//!
//! # async fn run() -> sleeptracker_core::TrackerResult<()> {
//! // Named port: any failure is reported
//! let acquisition = AcquisitionBuilder::new()
//!     .model(WatchModel::FramedFlashLog)
//!     .port("/dev/ttyUSB0")
//!     .build()?;
//! let night = acquisition.acquire().await?;
//!
//! // No port: every serial port is tried in turn
//! let night = AcquisitionBuilder::new().build()?.acquire().await?;
//! # Ok(())
//! # }
//! ```

use super::acquisition::Acquisition;
use super::ports::{PortProvider, SystemPorts};
use chrono::Datelike;
use sleeptracker_core::{default_sink, SharedSink, TrackerError, TrackerResult, WatchModel};
use sleeptracker_transport::PollSettings;
use std::ops::RangeInclusive;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Reference years accepted by [`AcquisitionBuilder::build`]
pub const REFERENCE_YEARS: RangeInclusive<i32> = 2000..=2100;

/// Builder for an [`Acquisition`]
///
/// # Default Settings
/// - Model: Sleeptracker Pro (legacy)
/// - Port: none, every serial port is tried
/// - Baud rate: the model's
/// - Reference year: the current local year
/// - Diagnostics: forwarded to the `log` facade
pub struct AcquisitionBuilder {
    model: WatchModel,
    port: Option<String>,
    baud_rate: Option<u32>,
    reference_year: Option<i32>,
    sink: Option<SharedSink>,
    poll_settings: PollSettings,
    cancel_flag: Option<Arc<AtomicBool>>,
    port_provider: Option<Arc<dyn PortProvider>>,
}

impl AcquisitionBuilder {
    pub fn new() -> Self {
        Self {
            model: WatchModel::default(),
            port: None,
            baud_rate: None,
            reference_year: None,
            sink: None,
            poll_settings: PollSettings::default(),
            cancel_flag: None,
            port_provider: None,
        }
    }

    pub fn model(mut self, model: WatchModel) -> Self {
        self.model = model;
        self
    }

    /// Read from this port only, surfacing any failure
    pub fn port(mut self, port_name: impl Into<String>) -> Self {
        self.port = Some(port_name.into());
        self
    }

    /// Override the model's baud rate
    ///
    /// Later Sleeptracker Pro revisions accept faster lines.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    /// Year used where the watch does not report a plausible one
    pub fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn poll_settings(mut self, settings: PollSettings) -> Self {
        self.poll_settings = settings;
        self
    }

    /// Flag checked before each port is opened
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    pub fn port_provider(mut self, provider: Arc<dyn PortProvider>) -> Self {
        self.port_provider = Some(provider);
        self
    }

    /// Validate the configuration and build the acquisition
    pub fn build(self) -> TrackerResult<Acquisition> {
        let reference_year = self
            .reference_year
            .unwrap_or_else(|| chrono::Local::now().year());
        if !REFERENCE_YEARS.contains(&reference_year) {
            return Err(TrackerError::InvalidConfig(format!(
                "Reference year {} outside {}..={}",
                reference_year,
                REFERENCE_YEARS.start(),
                REFERENCE_YEARS.end()
            )));
        }

        let baud_rate = self.baud_rate.unwrap_or_else(|| self.model.baud_rate());
        if baud_rate == 0 {
            return Err(TrackerError::InvalidConfig(
                "Baud rate must be non-zero".to_string(),
            ));
        }

        if let Some(port) = &self.port {
            if port.trim().is_empty() {
                return Err(TrackerError::InvalidConfig(
                    "Port name must not be empty".to_string(),
                ));
            }
        }

        Ok(Acquisition {
            model: self.model,
            port: self.port,
            baud_rate,
            reference_year,
            poll_settings: self.poll_settings,
            sink: self.sink.unwrap_or_else(default_sink),
            cancel_flag: self.cancel_flag,
            provider: self
                .port_provider
                .unwrap_or_else(|| Arc::new(SystemPorts) as Arc<dyn PortProvider>),
        })
    }
}

impl Default for AcquisitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
