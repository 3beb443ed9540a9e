//! Packet selection and sequence-id validation.
//!
//! A selection is resolved against the segmented sequence before anything is
//! rendered or extracted. Ids are then validated against the *selection*:
//! the first selected packet is expected to carry id 0, the next id 1, and
//! so on, whatever its position in the stream.

use thiserror::Error;

use crate::packet::Packet;

/// Which packets to operate on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every packet, in stream order.
    #[default]
    All,
    /// The listed stream indices, in the given order. Duplicates are kept.
    Indices(Vec<usize>),
}

impl Selection {
    /// An empty list selects every packet.
    ///
    /// # Examples
    /// ```
    /// use dissect_core::Selection;
    ///
    /// assert_eq!(Selection::from_indices(Vec::new()), Selection::All);
    /// assert_eq!(Selection::from_indices(vec![2, 0]), Selection::Indices(vec![2, 0]));
    /// ```
    pub fn from_indices(indices: Vec<usize>) -> Self {
        if indices.is_empty() {
            Selection::All
        } else {
            Selection::Indices(indices)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("packet #{index} not found: the stream holds {len} packets")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A selected packet and its position in the stream.
#[derive(Debug, Clone, Copy)]
pub struct Selected<'p, 'a> {
    pub index: usize,
    pub packet: &'p Packet<'a>,
}

/// Resolve `selection` against `packets`.
///
/// # Errors
/// Returns `SelectError::IndexOutOfRange` for the first requested index
/// that does not exist. No partial selection is returned.
///
/// # Examples
/// ```
/// use dissect_core::packet::{PacketBuilder, segment};
/// use dissect_core::select::{SelectError, Selection, select};
///
/// let mut buf = Vec::new();
/// for id in 0..3 {
///     PacketBuilder::new(id).write_to(&mut buf)?;
/// }
/// let packets = segment(&buf)?;
///
/// let picked = select(&packets, &Selection::Indices(vec![2, 0]))?;
/// assert_eq!(picked.iter().map(|s| s.index).collect::<Vec<_>>(), vec![2, 0]);
///
/// let err = select(&packets, &Selection::Indices(vec![0, 3])).unwrap_err();
/// assert_eq!(err, SelectError::IndexOutOfRange { index: 3, len: 3 });
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn select<'p, 'a>(
    packets: &'p [Packet<'a>],
    selection: &Selection,
) -> Result<Vec<Selected<'p, 'a>>, SelectError> {
    match selection {
        Selection::All => Ok(packets
            .iter()
            .enumerate()
            .map(|(index, packet)| Selected { index, packet })
            .collect()),
        Selection::Indices(indices) => indices
            .iter()
            .map(|&index| {
                packets
                    .get(index)
                    .map(|packet| Selected { index, packet })
                    .ok_or(SelectError::IndexOutOfRange {
                        index,
                        len: packets.len(),
                    })
            })
            .collect(),
    }
}

/// Running expected-id counter. Wraps after 255.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u8,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> u8 {
        self.next
    }

    /// Return the current expected id and move to the next one.
    pub fn advance(&mut self) -> u8 {
        let current = self.next;
        self.next = self.next.wrapping_add(1);
        current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCheck {
    pub expected: u8,
    pub actual: u8,
}

impl IdCheck {
    pub fn is_valid(&self) -> bool {
        self.expected == self.actual
    }
}

/// Check each packet's id against its position in `packets`.
pub fn validate_ids<'p, 'a: 'p, I>(packets: I) -> Vec<IdCheck>
where
    I: IntoIterator<Item = &'p Packet<'a>>,
{
    packets
        .into_iter()
        .scan(IdSequence::new(), |seq, packet| {
            Some(IdCheck {
                expected: seq.advance(),
                actual: packet.header().id(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{IdSequence, SelectError, Selection, select, validate_ids};
    use crate::packet::{PacketBuilder, segment};

    fn stream(ids: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        for id in ids {
            PacketBuilder::new(*id)
                .payload(&[0x11, 0x22])
                .write_to(&mut buf)
                .unwrap();
        }
        buf
    }

    #[test]
    fn all_keeps_stream_order() {
        let buf = stream(&[0, 1, 2]);
        let packets = segment(&buf).unwrap();
        let picked = select(&packets, &Selection::All).unwrap();
        let indices: Vec<usize> = picked.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn indices_keep_caller_order_and_duplicates() {
        let buf = stream(&[0, 1, 2]);
        let packets = segment(&buf).unwrap();
        let picked = select(&packets, &Selection::Indices(vec![2, 0, 2])).unwrap();
        let offsets: Vec<usize> = picked.iter().map(|s| s.packet.offset()).collect();
        assert_eq!(offsets, vec![20, 0, 20]);
    }

    #[test]
    fn out_of_range_reports_first_bad_index() {
        let buf = stream(&[0, 1]);
        let packets = segment(&buf).unwrap();
        let err = select(&packets, &Selection::Indices(vec![1, 5, 0, 9])).unwrap_err();
        assert_eq!(err, SelectError::IndexOutOfRange { index: 5, len: 2 });
    }

    #[test]
    fn index_equal_to_len_is_out_of_range() {
        let buf = stream(&[0, 1]);
        let packets = segment(&buf).unwrap();
        let err = select(&packets, &Selection::Indices(vec![2])).unwrap_err();
        assert_eq!(err, SelectError::IndexOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn selecting_from_empty_stream() {
        let packets = segment(&[]).unwrap();
        assert!(select(&packets, &Selection::All).unwrap().is_empty());
        assert!(select(&packets, &Selection::Indices(vec![0])).is_err());
    }

    #[test]
    fn ids_validate_against_stream_positions() {
        let buf = stream(&[0, 5, 2]);
        let packets = segment(&buf).unwrap();
        let checks = validate_ids(&packets);
        let valid: Vec<bool> = checks.iter().map(|c| c.is_valid()).collect();
        assert_eq!(valid, vec![true, false, true]);
        assert_eq!(checks[1].expected, 1);
        assert_eq!(checks[1].actual, 5);
    }

    #[test]
    fn ids_validate_against_selection_order() {
        let buf = stream(&[0, 1, 2]);
        let packets = segment(&buf).unwrap();

        let picked = select(&packets, &Selection::Indices(vec![1])).unwrap();
        let checks = validate_ids(picked.iter().map(|s| s.packet));
        assert_eq!(checks[0].expected, 0);
        assert!(!checks[0].is_valid());

        let picked = select(&packets, &Selection::Indices(vec![1, 0])).unwrap();
        let checks = validate_ids(picked.iter().map(|s| s.packet));
        assert!(checks.iter().all(|c| !c.is_valid()));
    }

    #[test]
    fn id_sequence_wraps() {
        let mut seq = IdSequence::new();
        for _ in 0..255 {
            seq.advance();
        }
        assert_eq!(seq.advance(), 255);
        assert_eq!(seq.peek(), 0);
    }
}
