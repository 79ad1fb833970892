//! Serial line to a docked watch

use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use sleeptracker_core::{TrackerError, TrackerResult};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortType, SerialStream};

/// Semi-blocking read timeout of the line
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// `SerialStream` has no `Debug`
struct DebugSerialStream(SerialStream);

impl fmt::Debug for DebugSerialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialStream").finish()
    }
}

impl Deref for DebugSerialStream {
    type Target = SerialStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugSerialStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// How to open the watch line
#[derive(Debug, Clone, PartialEq)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: tokio_serial::DataBits,
    pub stop_bits: tokio_serial::StopBits,
    pub parity: tokio_serial::Parity,
    pub flow_control: tokio_serial::FlowControl,
    pub read_timeout: Duration,
}

impl SerialSettings {
    /// 8 data bits, 1 stop bit, no parity, no flow control
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            data_bits: tokio_serial::DataBits::Eight,
            stop_bits: tokio_serial::StopBits::One,
            parity: tokio_serial::Parity::None,
            flow_control: tokio_serial::FlowControl::None,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Settings with a custom read timeout
    pub fn with_timeout(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            read_timeout: timeout,
            ..Self::new(port_name, baud_rate)
        }
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {} 8N1", self.port_name, self.baud_rate)
    }
}

/// The watch cradle, seen through tokio-serial
#[derive(Debug)]
pub struct SerialTransport {
    stream: Option<DebugSerialStream>,
    settings: SerialSettings,
}

impl SerialTransport {
    /// Transport for `settings`; the port is claimed by `open`
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
        }
    }

    /// Transport with 8N1 framing at `baud_rate`
    pub fn new_simple(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self::new(SerialSettings::new(port_name, baud_rate))
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> TrackerResult<&mut DebugSerialStream> {
        self.stream.as_mut().ok_or_else(|| {
            TrackerError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Watch line is not open",
            ))
        })
    }
}

fn serial_error(e: tokio_serial::Error) -> TrackerError {
    TrackerError::Serial(e.to_string())
}

#[async_trait]
impl TransportLayer for SerialTransport {
    async fn open(&mut self) -> TrackerResult<()> {
        if self.stream.is_some() {
            return Err(TrackerError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Watch line is already open",
            )));
        }

        let builder = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(self.settings.data_bits)
            .stop_bits(self.settings.stop_bits)
            .parity(self.settings.parity)
            .flow_control(self.settings.flow_control)
            .timeout(self.settings.read_timeout);

        let stream = SerialStream::open(&builder).map_err(|e| {
            TrackerError::Serial(format!(
                "Unable to open port {}: {}",
                self.settings.port_name, e
            ))
        })?;

        log::info!("Serial port {} opened", self.settings);
        self.stream = Some(DebugSerialStream(stream));
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for SerialTransport {
    async fn read(&mut self, buf: &mut [u8]) -> TrackerResult<usize> {
        let stream = self.stream_mut()?;
        match stream.read(buf).await {
            Ok(n) => Ok(n),
            Err(e) => {
                // A line that failed a read is released on the spot
                log::warn!("Read on {} failed, releasing it: {}", self.settings.port_name, e);
                self.stream = None;
                Err(TrackerError::Connection(e))
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> TrackerResult<usize> {
        let stream = self.stream_mut()?;
        stream.write(buf).await.map_err(TrackerError::Connection)
    }

    async fn flush(&mut self) -> TrackerResult<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(TrackerError::Connection)
    }

    async fn set_control_lines(&mut self, dtr: bool, rts: bool) -> TrackerResult<()> {
        let stream = self.stream_mut()?;
        stream.write_request_to_send(rts).map_err(serial_error)?;
        stream.write_data_terminal_ready(dtr).map_err(serial_error)?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    async fn close(&mut self) -> TrackerResult<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush().await {
                log::warn!("Flush before closing {} failed: {}", self.settings.port_name, e);
            }
            log::info!("Serial port {} closed", self.settings.port_name);
        }
        Ok(())
    }
}

/// A serial port a watch could be attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    pub name: String,
    pub description: String,
}

impl fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.description)
    }
}

/// macOS lists every device twice; the `tty.*` call-in nodes block on open
fn is_call_in_duplicate(port_name: &str) -> bool {
    port_name
        .rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with("tty."))
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => match (&info.manufacturer, &info.product) {
            (_, Some(product)) => product.clone(),
            (Some(manufacturer), None) => manufacturer.clone(),
            (None, None) => format!("USB {:04X}:{:04X}", info.vid, info.pid),
        },
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        SerialPortType::Unknown => "Serial port".to_string(),
    }
}

/// List the serial ports present on this machine
pub fn list_ports() -> TrackerResult<Vec<PortDescriptor>> {
    let ports = tokio_serial::available_ports().map_err(serial_error)?;
    Ok(ports
        .into_iter()
        .filter(|info| !is_call_in_duplicate(&info.port_name))
        .map(|info| PortDescriptor {
            description: describe(&info.port_type),
            name: info.port_name,
        })
        .collect())
}
