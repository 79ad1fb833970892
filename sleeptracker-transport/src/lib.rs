//! Transport layer module for Sleeptracker watches
//!
//! This crate provides the serial line (and a generic async stream
//! wrapper) plus the polling session that drives it: handshake, timed
//! response waits and scoped release of the port.

pub mod io;
pub mod serial;
pub mod session;
pub mod stream;

pub use io::IoTransport;
pub use serial::{list_ports, PortDescriptor, SerialSettings, SerialTransport, DEFAULT_READ_TIMEOUT};
pub use session::{PollSettings, TransportSession, HANDSHAKE};
pub use stream::{StreamAccessor, TransportLayer};
