//! SLIP-style framing used by the Elite family

pub mod codec;
pub mod frame;

pub use codec::{decode_escapes, encode_escapes, FRAME_END, FRAME_ESC, FRAME_ESC_END, FRAME_ESC_ESC};
pub use frame::{
    ends_frame, make_command, read_word_le, require_len, validate_frame, RawFrame, FRAME_TRAILER,
    MIN_FRAME_LENGTH, SIZE_FIELD_LENGTH,
};
