use super::error::DecodeError;
use super::layout;

/// Bounds-checked big-endian reads over a header window.
pub struct HeaderReader<'a> {
    window: &'a [u8],
}

impl<'a> HeaderReader<'a> {
    pub fn new(window: &'a [u8]) -> Self {
        Self { window }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.window.len() < needed {
            return Err(DecodeError::TruncatedHeader {
                needed,
                actual: self.window.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, DecodeError> {
        self.window
            .get(offset)
            .copied()
            .ok_or(DecodeError::TruncatedHeader {
                needed: offset + 1,
                actual: self.window.len(),
            })
    }

    pub fn read_u16_be(&self, range: std::ops::Range<usize>) -> Result<u16, DecodeError> {
        let bytes = self.read_slice(range)?;
        match bytes {
            &[high, low] => Ok(u16::from_be_bytes([high, low])),
            _ => Err(DecodeError::TruncatedHeader {
                needed: 2,
                actual: bytes.len(),
            }),
        }
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], DecodeError> {
        self.window
            .get(range.clone())
            .ok_or(DecodeError::TruncatedHeader {
                needed: range.end,
                actual: self.window.len(),
            })
    }

    /// The raw header bytes, copied out of the window.
    pub fn read_raw_header(&self) -> Result<[u8; layout::HEADER_SIZE], DecodeError> {
        let bytes = self.read_slice(0..layout::HEADER_SIZE)?;
        let mut raw = [0u8; layout::HEADER_SIZE];
        raw.copy_from_slice(bytes);
        Ok(raw)
    }

    /// Bytes following the header, bounded by the declared packet length and
    /// by the end of the window.
    pub fn payload_within(&self, declared_length: u16) -> &'a [u8] {
        let end = usize::from(declared_length).min(self.window.len());
        self.window.get(layout::HEADER_SIZE..end).unwrap_or(&[])
    }
}
