//! Command/response protocol of the framed watches

pub mod command;
pub mod framed;
pub mod layout;

pub use command::Command;
pub use framed::{
    decode_alarm, decode_date, decode_device_name, decode_events, decode_time, AlarmSettings,
    FramedProtocol, WakeEvents,
};
