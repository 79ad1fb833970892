//! Frame structure, validation and request encoding

use crate::slip::codec::{decode_escapes, FRAME_END};
use sleeptracker_core::{hex_dump, ProtocolError};
use std::fmt;

/// Shortest buffer that can hold both delimiters
pub const MIN_FRAME_LENGTH: usize = 2;

/// Optional byte some devices send after the closing delimiter
pub const FRAME_TRAILER: u8 = 0x00;

/// Length of the size prefix at the start of every response payload
pub const SIZE_FIELD_LENGTH: usize = 2;

/// Build the 4-byte request frame for an opcode
pub fn make_command(opcode: u8) -> [u8; 4] {
    [FRAME_END, opcode, 0x00, FRAME_END]
}

/// Little-endian word at `offset`
///
/// The caller checks bounds beforehand; see [`require_len`].
pub fn read_word_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Fail with [`ProtocolError::Truncated`] unless `data` holds `needed` bytes
pub fn require_len(data: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if data.len() < needed {
        Err(ProtocolError::Truncated {
            needed,
            available: data.len(),
        })
    } else {
        Ok(())
    }
}

/// True when the buffer ends with `C0` or `C0 00` after at least one other byte
pub fn ends_frame(data: &[u8]) -> bool {
    match data {
        [.., FRAME_END, FRAME_TRAILER] => data.len() >= 3,
        [.., FRAME_END] => data.len() >= MIN_FRAME_LENGTH,
        _ => false,
    }
}

/// Check the delimiters of a received frame
pub fn validate_frame(data: &[u8]) -> Result<(), ProtocolError> {
    if data.len() < MIN_FRAME_LENGTH {
        return Err(ProtocolError::MalformedFrame(format!(
            "Frame too short: {} bytes",
            data.len()
        )));
    }

    if data[0] != FRAME_END {
        return Err(ProtocolError::MalformedFrame(format!(
            "Frame does not start with 0xC0, got: 0x{:02X}",
            data[0]
        )));
    }

    if !ends_frame(data) {
        let tail = &data[data.len() - MIN_FRAME_LENGTH..];
        return Err(ProtocolError::MalformedFrame(format!(
            "Frame does not end properly, last bytes: {}",
            hex_dump(tail)
        )));
    }

    Ok(())
}

/// A validated response frame
///
/// Wire layout: `C0 <opcode> <stuffed payload> C0 [00]`, where the
/// unstuffed payload is a little-endian size word followed by the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    opcode: Option<u8>,
    payload: Vec<u8>,
    length: usize,
}

impl RawFrame {
    /// Validate a frame and unstuff its payload
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        validate_frame(frame)?;

        let mut end = frame.len() - 1;
        if frame[end] == FRAME_TRAILER && frame[end - 1] == FRAME_END {
            end -= 1;
        }

        // Skip the opening delimiter and the echoed opcode
        let start = 2;
        let opcode = if end > 1 { Some(frame[1]) } else { None };
        let payload = if start < end {
            decode_escapes(&frame[start..end])
        } else {
            Vec::new()
        };

        Ok(Self {
            opcode,
            payload,
            length: frame.len(),
        })
    }

    /// Opcode echoed by the device, if the frame carried one
    pub fn opcode(&self) -> Option<u8> {
        self.opcode
    }

    /// Unstuffed payload, size prefix included
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Declared size of the data part, if the payload has a size prefix
    pub fn declared_size(&self) -> Option<usize> {
        if self.payload.len() < SIZE_FIELD_LENGTH {
            None
        } else {
            Some(read_word_le(&self.payload, 0) as usize)
        }
    }

    /// Data following the size prefix
    ///
    /// A declared size larger than what arrived is clamped to what arrived.
    /// A payload too short for a size prefix is returned as is.
    pub fn data(&self) -> &[u8] {
        match self.declared_size() {
            Some(size) => {
                let available = self.payload.len() - SIZE_FIELD_LENGTH;
                &self.payload[SIZE_FIELD_LENGTH..SIZE_FIELD_LENGTH + size.min(available)]
            }
            None => &self.payload,
        }
    }

    /// Length of the frame on the wire
    pub fn length(&self) -> usize {
        self.length
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Some(op) => write!(
                f,
                "Frame: opcode=0x{:02X}, payload={} bytes, len={}",
                op,
                self.payload.len(),
                self.length
            ),
            None => write!(f, "Frame: empty, len={}", self.length),
        }
    }
}
