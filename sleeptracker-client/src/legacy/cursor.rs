//! Forward-only decode cursor with a running checksum
//!
//! Every read takes the cursor by value and hands back the advanced cursor
//! together with the value read, so the checksum accumulator travels with
//! the position instead of living in shared state. A cursor is finished
//! exactly once, by checking the record's ending marker.

use sleeptracker_core::ProtocolError;

/// Low 8 bits of the sum of every byte read so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningSum(u8);

impl RunningSum {
    pub fn add(self, byte: u8) -> Self {
        Self(self.0.wrapping_add(byte))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Position in a legacy record
#[derive(Debug)]
pub struct DecodeCursor<'a> {
    data: &'a [u8],
    position: usize,
    sum: RunningSum,
}

impl<'a> DecodeCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            sum: RunningSum::default(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn sum(&self) -> RunningSum {
        self.sum
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn truncated(&self, wanted: usize) -> ProtocolError {
        ProtocolError::Truncated {
            needed: self.position + wanted,
            available: self.data.len(),
        }
    }

    /// Next byte, without touching the sum
    fn take(mut self) -> Result<(Self, u8), ProtocolError> {
        let byte = *self.data.get(self.position).ok_or_else(|| self.truncated(1))?;
        self.position += 1;
        Ok((self, byte))
    }

    /// Next byte, added to the sum
    pub fn byte(self) -> Result<(Self, u8), ProtocolError> {
        let (mut cursor, byte) = self.take()?;
        cursor.sum = cursor.sum.add(byte);
        Ok((cursor, byte))
    }

    /// Skip `count` bytes; skipped bytes still count towards the sum
    pub fn skip(self, count: usize) -> Result<Self, ProtocolError> {
        (0..count).try_fold(self, |cursor, _| cursor.byte().map(|(next, _)| next))
    }

    /// Little-endian 16-bit word
    pub fn word_le(self) -> Result<(Self, u16), ProtocolError> {
        let (cursor, low) = self.byte()?;
        let (cursor, high) = cursor.byte()?;
        Ok((cursor, u16::from_le_bytes([low, high])))
    }

    /// Two-byte packed field, exactly as stored
    ///
    /// Dates and times are packed this way. They are interpreted only
    /// once the checksum has vouched for them.
    pub fn pair(self) -> Result<(Self, [u8; 2]), ProtocolError> {
        let (cursor, first) = self.byte()?;
        let (cursor, second) = cursor.byte()?;
        Ok((cursor, [first, second]))
    }

    /// Read the checksum byte and compare it with the sum so far
    ///
    /// The checksum byte itself is not summed.
    pub fn checksum(self) -> Result<(Self, u8), ProtocolError> {
        let expected = self.sum.value();
        let (cursor, got) = self.take()?;
        if got != expected {
            return Err(ProtocolError::ChecksumMismatch { got, expected });
        }
        Ok((cursor, got))
    }

    /// Check the ending marker and retire the cursor
    ///
    /// Returns the number of bytes the record occupied. Bytes after the
    /// marker are left alone.
    pub fn finish(self, ending: &[u8]) -> Result<usize, ProtocolError> {
        let end = self.position + ending.len();
        let got = self.data.get(self.position..end).ok_or_else(|| self.truncated(ending.len()))?;
        if got != ending {
            return Err(ProtocolError::MalformedEnding {
                got: got.to_vec(),
                expected: ending.to_vec(),
            });
        }
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_sum_wraps() {
        let sum = RunningSum::default().add(0xF0).add(0x20);
        assert_eq!(sum.value(), 0x10);
    }

    #[test]
    fn test_reads_advance_and_sum() {
        let data = [0x06, 0x0E, 0x02, 0x10, 0xBC, 0x01];
        let cursor = DecodeCursor::new(&data);
        let (cursor, date) = cursor.pair().unwrap();
        let (cursor, time) = cursor.pair().unwrap();
        let (cursor, word) = cursor.word_le().unwrap();

        assert_eq!(date, [0x06, 0x0E]);
        assert_eq!(time, [0x02, 0x10]);
        assert_eq!(word, 444);
        assert_eq!(cursor.position(), 6);
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.sum().value(), 0xE3);
    }

    #[test]
    fn test_skip_counts_towards_sum() {
        let cursor = DecodeCursor::new(&[0x01, 0x02, 0x03]).skip(2).unwrap();
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.sum().value(), 0x03);
    }

    #[test]
    fn test_read_past_end() {
        let (cursor, _) = DecodeCursor::new(&[0x06]).byte().unwrap();
        assert_eq!(
            cursor.byte().unwrap_err(),
            ProtocolError::Truncated {
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_checksum() {
        let cursor = DecodeCursor::new(&[0x10, 0x20, 0x30]).skip(2).unwrap();
        let (cursor, sum) = cursor.checksum().unwrap();
        assert_eq!(sum, 0x30);
        assert_eq!(cursor.finish(&[]).unwrap(), 3);

        let cursor = DecodeCursor::new(&[0x10, 0x20, 0x31]).skip(2).unwrap();
        assert_eq!(
            cursor.checksum().unwrap_err(),
            ProtocolError::ChecksumMismatch {
                got: 0x31,
                expected: 0x30
            }
        );
    }

    #[test]
    fn test_finish() {
        let cursor = DecodeCursor::new(&[0x20, 0xFF]);
        assert_eq!(cursor.finish(&[0x20]).unwrap(), 1);

        let cursor = DecodeCursor::new(&[0x21]);
        assert_eq!(
            cursor.finish(&[0x20]).unwrap_err(),
            ProtocolError::MalformedEnding {
                got: vec![0x21],
                expected: vec![0x20]
            }
        );

        let cursor = DecodeCursor::new(&[]);
        assert!(matches!(
            cursor.finish(&[0x20]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_pair_keeps_out_of_range_bytes() {
        let (cursor, raw) = DecodeCursor::new(&[0x86, 0x0E]).pair().unwrap();
        assert_eq!(raw, [0x86, 0x0E]);
        assert_eq!(cursor.sum().value(), 0x94);
    }
}
