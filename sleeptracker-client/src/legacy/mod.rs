//! Sleeptracker Pro: handshake-triggered record dump

pub mod cursor;
pub mod reader;
pub mod record;

pub use cursor::{DecodeCursor, RunningSum};
pub use reader::{locate_record, read_legacy_record};
pub use record::{decode_record, LegacyRecord, RECORD_ENDING};
