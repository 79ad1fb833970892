//! Byte stuffing for framed payloads

/// Frame delimiter
pub const FRAME_END: u8 = 0xC0;

/// Escape byte
pub const FRAME_ESC: u8 = 0xDB;

/// Escaped substitute for [`FRAME_END`]
pub const FRAME_ESC_END: u8 = 0xDC;

/// Escaped substitute for [`FRAME_ESC`]
pub const FRAME_ESC_ESC: u8 = 0xDD;

/// Stuff a payload for the wire
///
/// Every delimiter becomes `DB DC` and every literal escape byte becomes
/// `DB DD`. All other bytes pass through unchanged.
pub fn encode_escapes(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 16);
    for &b in payload {
        match b {
            FRAME_END => out.extend_from_slice(&[FRAME_ESC, FRAME_ESC_END]),
            FRAME_ESC => out.extend_from_slice(&[FRAME_ESC, FRAME_ESC_ESC]),
            _ => out.push(b),
        }
    }
    out
}

/// Undo [`encode_escapes`]
///
/// An escape byte that is not followed by one of the two recognised
/// successors (or that ends the input) is kept literally.
pub fn decode_escapes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        if b == FRAME_ESC {
            match data.get(i + 1) {
                Some(&FRAME_ESC_END) => {
                    out.push(FRAME_END);
                    i += 2;
                    continue;
                }
                Some(&FRAME_ESC_ESC) => {
                    out.push(FRAME_ESC);
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }
        out.push(b);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_special_bytes() {
        assert_eq!(
            encode_escapes(&[0x01, FRAME_END, 0x02, FRAME_ESC]),
            vec![0x01, FRAME_ESC, FRAME_ESC_END, 0x02, FRAME_ESC, FRAME_ESC_ESC]
        );
    }

    #[test]
    fn test_encode_leaves_other_bytes() {
        let plain: Vec<u8> = (0u8..=0xFF)
            .filter(|b| *b != FRAME_END && *b != FRAME_ESC)
            .collect();
        assert_eq!(encode_escapes(&plain), plain);
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        let all: Vec<u8> = (0u8..=0xFF).collect();
        assert_eq!(decode_escapes(&encode_escapes(&all)), all);

        let stuffed = vec![FRAME_ESC, FRAME_END, FRAME_END, FRAME_ESC, FRAME_ESC_END];
        assert_eq!(decode_escapes(&encode_escapes(&stuffed)), stuffed);
    }

    #[test]
    fn test_decode_unknown_escape_is_literal() {
        assert_eq!(decode_escapes(&[FRAME_ESC, 0x41]), vec![FRAME_ESC, 0x41]);
        assert_eq!(decode_escapes(&[0x10, FRAME_ESC]), vec![0x10, FRAME_ESC]);
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(
            decode_escapes(&[FRAME_ESC, FRAME_ESC_END, FRAME_ESC, FRAME_ESC_ESC]),
            vec![FRAME_END, FRAME_ESC]
        );
    }
}
