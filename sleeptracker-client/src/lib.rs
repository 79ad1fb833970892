//! Acquisition client for Sleeptracker watches
//!
//! This crate turns what a watch sends into a [`SleepSession`]:
//! - the command/response protocol of the framed Elite family
//! - the handshake-triggered record dump of the Sleeptracker Pro
//! - the Elite 2 flash log
//! - the session assembler that picks a strategy and a port
//!
//! [`SleepSession`]: sleeptracker_core::SleepSession

pub mod assembler;
pub mod flash;
pub mod legacy;
pub mod protocol;

pub use assembler::{Acquisition, AcquisitionBuilder, PortProvider, SystemPorts};
pub use flash::parse_flash_log;
pub use legacy::{decode_record, read_legacy_record, LegacyRecord};
pub use protocol::{AlarmSettings, Command, FramedProtocol};
