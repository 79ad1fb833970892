//! sleeptracker - reading nights from Sleeptracker watches
//!
//! This library reads the last recorded night from a Sleeptracker watch
//! over a serial line and returns it as a validated [`SleepSession`].
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `sleeptracker-core`: Session type, watch models, errors, diagnostic sink
//! - `sleeptracker-transport`: Serial and generic stream transports, polling session
//! - `sleeptracker-session`: SLIP-style framing of the Elite family
//! - `sleeptracker-client`: Command protocol, record decoders, session assembler
//!
//! # Supported Watches
//!
//! ## ✅ 已完成
//! - Sleeptracker Pro（握手触发的记录转储，校验和，2400 波特）
//! - Sleeptracker Elite（命令/响应协议，19200 波特）
//! - Sleeptracker Elite 2（闪存日志，失败时回退到逐字段命令）
//! - 端口扫描（逐个尝试，按错误类型区分跳过与失败）
//!
//! # Usage
//!
//! ```no_run
//! use sleeptracker::{AcquisitionBuilder, WatchModel};
//!
//! # async fn run() -> sleeptracker::TrackerResult<()> {
//! let acquisition = AcquisitionBuilder::new()
//!     .model(WatchModel::Framed)
//!     .port("/dev/ttyUSB0")
//!     .build()?;
//! if let Some(night) = acquisition.acquire().await? {
//!     println!("{}", night);
//! }
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use sleeptracker_core::{
    DiagnosticSink, LogSink, MemorySink, NullSink, ProtocolError, SharedSink, SleepSession,
    TrackerError, TrackerResult, WatchModel,
};

// Re-export the acquisition API
pub use sleeptracker_client::{Acquisition, AcquisitionBuilder, PortProvider};
pub use sleeptracker_transport::{list_ports, PollSettings, PortDescriptor};

// Re-export client API
pub mod client {
    pub use sleeptracker_client::*;
}

// Re-export transport API
pub mod transport {
    pub use sleeptracker_transport::*;
}

// Re-export framing
pub mod framing {
    pub use sleeptracker_session::*;
}
