//! Where the assembler gets its lines from

use async_trait::async_trait;
use sleeptracker_core::TrackerResult;
use sleeptracker_transport::{list_ports, SerialSettings, SerialTransport, StreamAccessor, TransportLayer};

/// Enumerates and opens the lines a watch may be attached to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortProvider: Send + Sync {
    /// Port names worth trying, in order
    fn candidate_ports(&self) -> TrackerResult<Vec<String>>;

    /// Open one port exclusively
    async fn open(&self, settings: &SerialSettings) -> TrackerResult<Box<dyn StreamAccessor>>;
}

/// The serial ports of this machine
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPorts;

#[async_trait]
impl PortProvider for SystemPorts {
    fn candidate_ports(&self) -> TrackerResult<Vec<String>> {
        let ports = list_ports()?;
        for port in &ports {
            log::debug!("Found port {}", port);
        }
        Ok(ports.into_iter().map(|port| port.name).collect())
    }

    async fn open(&self, settings: &SerialSettings) -> TrackerResult<Box<dyn StreamAccessor>> {
        let mut transport = SerialTransport::new(settings.clone());
        transport.open().await?;
        Ok(Box::new(transport))
    }
}
