//! Request opcodes of the framed protocol

use sleeptracker_session::make_command;
use std::fmt;

/// A request the framed watches answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Date,
    Alarm,
    Events,
    DeviceName,
    Time,
    FlashLog,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Date,
        Command::Alarm,
        Command::Events,
        Command::DeviceName,
        Command::Time,
        Command::FlashLog,
    ];

    /// Opcode byte sent in the request and echoed in the response
    pub fn opcode(&self) -> u8 {
        match self {
            Command::Date => 0x02,
            Command::Alarm => 0x04,
            Command::Events => 0x05,
            Command::DeviceName => 0x07,
            Command::Time => 0x09,
            Command::FlashLog => 0x0A,
        }
    }

    /// Wire bytes worth waiting for before parsing the response
    ///
    /// Shorter responses are still parsed once the response budget is spent.
    pub fn expected_len(&self) -> usize {
        match self {
            Command::Date | Command::Time => 10,
            Command::Alarm => 20,
            Command::DeviceName => 36,
            Command::Events | Command::FlashLog => 150,
        }
    }

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.opcode() == opcode)
    }

    /// The 4-byte request frame
    pub fn request(&self) -> [u8; 4] {
        make_command(self.opcode())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Date => "readDate",
            Command::Alarm => "readAlarm",
            Command::Events => "readEvents",
            Command::DeviceName => "readDeviceName",
            Command::Time => "readTime",
            Command::FlashLog => "readFlashLog",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.opcode())
    }
}
