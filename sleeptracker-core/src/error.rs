use thiserror::Error;

/// Failures raised while decoding what a watch sent
///
/// None of these is fatal for the whole acquisition: the assembler treats
/// each one as the end of the current attempt and may move on to another
/// port or another strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Timeout: no response from device")]
    Timeout,

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Truncated data: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Incorrect checksum: {got}, expected: {expected}")]
    ChecksumMismatch { got: u8, expected: u8 },

    #[error("Malformed ending: got {got:02X?}, expected {expected:02X?}")]
    MalformedEnding { got: Vec<u8>, expected: Vec<u8> },

    #[error("Unexpected handshake echo: 0x{0:02X}")]
    UnexpectedEcho(u8),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("No recorded sleep data on the watch")]
    NoData,
}

/// Main error type for acquisition operations
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrackerError {
    /// True for failures of the line itself (port busy, unplugged, refused)
    pub fn is_io(&self) -> bool {
        matches!(self, TrackerError::Connection(_) | TrackerError::Serial(_))
    }

    /// The decoding failure behind this error, if any
    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            TrackerError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for acquisition operations
pub type TrackerResult<T> = Result<T, TrackerError>;
