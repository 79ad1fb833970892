//! Core types and utilities for Sleeptracker watch acquisition
//!
//! This crate provides the decoded session type, the watch model tag, error
//! handling and the diagnostic sink used throughout the workspace.

pub mod diagnostics;
pub mod error;
pub mod model;
pub mod session;

pub use diagnostics::{
    default_sink, hex_dump, DiagnosticSink, LogSink, MemorySink, NullSink, SharedSink,
};
pub use error::{ProtocolError, TrackerError, TrackerResult};
pub use model::{WatchModel, FRAMED_BAUD_RATE, LEGACY_BAUD_RATE};
pub use session::SleepSession;
