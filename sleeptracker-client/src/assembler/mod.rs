//! Session assembler: strategy selection and port iteration

pub mod acquisition;
pub mod builder;
pub mod ports;
pub mod strategy;

pub use acquisition::Acquisition;
pub use builder::{AcquisitionBuilder, REFERENCE_YEARS};
pub use ports::{PortProvider, SystemPorts};
pub use strategy::{read_framed, DEFAULT_WINDOW_MINUTES};
