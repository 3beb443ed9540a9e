//! Internet checksum (one's-complement sum of 16-bit words).
//!
//! Words are read little-endian. A trailing odd byte is added as an 8-bit
//! value. Carries are folded back into the low 16 bits before the final
//! complement, so the result is total over every input, including the empty
//! slice.

/// Incremental Internet checksum accumulator.
///
/// Feeding the same bytes in several `update` calls gives the same result as
/// a single call over their concatenation, even when a chunk boundary splits
/// a 16-bit word.
///
/// # Examples
/// ```
/// use dissect_core::checksum::{Checksum, checksum};
///
/// let data = [0x3f, 0xfd, 0x00, 0x0c, 0x01];
/// let split = Checksum::new().chain_update(&data[..3]).chain_update(&data[3..]);
/// assert_eq!(split.finalize(), checksum(&data));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Checksum {
    state: u64,
    pending: Option<u8>,
}

impl Checksum {
    /// Create an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: 0,
            pending: None,
        }
    }

    /// Add one 16-bit word to the running sum.
    pub fn update_u16(&mut self, word: u16) {
        self.state += u64::from(word);
    }

    /// Add `data` to the running sum.
    pub fn update(&mut self, data: &[u8]) {
        let mut data = data;

        if let Some(low) = self.pending.take() {
            match data.split_first() {
                Some((&high, rest)) => {
                    self.update_u16(u16::from_le_bytes([low, high]));
                    data = rest;
                }
                None => {
                    self.pending = Some(low);
                    return;
                }
            }
        }

        let mut words = data.chunks_exact(2);
        for word in words.by_ref() {
            self.update_u16(u16::from_le_bytes([word[0], word[1]]));
        }
        if let &[last] = words.remainder() {
            self.pending = Some(last);
        }
    }

    /// Builder-style [`Checksum::update`].
    #[must_use]
    pub fn chain_update(mut self, data: &[u8]) -> Self {
        self.update(data);
        self
    }

    /// Folded one's-complement sum, before the final complement.
    #[must_use]
    pub fn sum(&self) -> u16 {
        let trailing = self.pending.map(u64::from).unwrap_or(0);
        fold(self.state + trailing)
    }

    /// Finish and return the checksum.
    #[must_use]
    pub fn finalize(self) -> u16 {
        !self.sum()
    }
}

/// Compute the checksum of `data`.
///
/// Equivalent to `Checksum::new().chain_update(data).finalize()`.
///
/// # Examples
/// ```
/// use dissect_core::checksum::checksum;
///
/// assert_eq!(checksum(&[]), 0xffff);
/// assert_eq!(checksum(&[0x01, 0x00]), 0xfffe);
/// ```
#[must_use]
pub fn checksum(data: &[u8]) -> u16 {
    Checksum::new().chain_update(data).finalize()
}

/// Standard verification step: the folded sum of `data` plus `checksum`
/// must be `0xffff`.
///
/// `checksum` is added as a native word, not read from `data`. A packet
/// header stores its checksum big-endian while words are summed
/// little-endian, so a packet as transmitted does not verify with a zero
/// checksum argument: zero the field and pass the decoded value instead.
///
/// # Examples
/// ```
/// use dissect_core::checksum::{checksum, verify};
///
/// let data = b"dissect";
/// assert!(verify(data, checksum(data)));
/// assert!(!verify(data, checksum(data) ^ 1));
/// ```
#[must_use]
pub fn verify(data: &[u8], checksum: u16) -> bool {
    let mut acc = Checksum::new().chain_update(data);
    acc.update_u16(checksum);
    acc.sum() == 0xffff
}

fn fold(mut sum: u64) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum >> 16) + (sum & 0xffff);
    }
    sum as u16
}
