//! Verbatim extraction of packet parts.

use std::io::Write;

use thiserror::Error;
use tracing::debug;

use crate::packet::{FramingError, segment};
use crate::select::{SelectError, Selected, Selection, select};

/// Which parts of each packet to copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractParts {
    pub header: bool,
    pub payload: bool,
}

impl ExtractParts {
    pub const HEADER: Self = Self {
        header: true,
        payload: false,
    };
    pub const PAYLOAD: Self = Self {
        header: false,
        payload: true,
    };
    pub const BOTH: Self = Self {
        header: true,
        payload: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.header && !self.payload
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("selection error: {0}")]
    Select(#[from] SelectError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the requested parts of each selected packet to `sink`, in order.
///
/// Returns the number of bytes written. Selecting no parts writes nothing
/// and returns 0.
///
/// # Errors
/// Returns `ExtractError::Io` when the sink fails.
pub fn extract_to<W: Write>(
    selected: &[Selected<'_, '_>],
    parts: ExtractParts,
    sink: &mut W,
) -> Result<u64, ExtractError> {
    let mut written = 0u64;

    for entry in selected {
        let packet = entry.packet;
        if parts.header {
            let raw = packet.header().raw();
            sink.write_all(raw)?;
            written += raw.len() as u64;
        }
        if parts.payload {
            sink.write_all(packet.payload())?;
            written += packet.payload().len() as u64;
        }
        debug!(index = entry.index, written, "extracted packet");
    }

    sink.flush()?;
    Ok(written)
}

/// Segment `bytes`, resolve `selection`, then extract.
///
/// Framing and selection both complete before the first byte reaches
/// `sink`, so a structural error leaves the sink untouched.
///
/// # Errors
/// Returns `ExtractError` on framing, selection or sink failure.
///
/// # Examples
/// ```
/// use dissect_core::packet::PacketBuilder;
/// use dissect_core::{ExtractParts, Selection, extract_bytes};
///
/// let mut input = Vec::new();
/// PacketBuilder::new(0).payload(b"abcd").write_to(&mut input)?;
/// PacketBuilder::new(1).payload(b"efgh").write_to(&mut input)?;
///
/// let mut out = Vec::new();
/// let n = extract_bytes(&input, &Selection::All, ExtractParts::PAYLOAD, &mut out)?;
/// assert_eq!(n, 8);
/// assert_eq!(out, b"abcdefgh");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract_bytes<W: Write>(
    bytes: &[u8],
    selection: &Selection,
    parts: ExtractParts,
    sink: &mut W,
) -> Result<u64, ExtractError> {
    let packets = segment(bytes)?;
    let selected = select(&packets, selection)?;
    extract_to(&selected, parts, sink)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::{ExtractError, ExtractParts, extract_bytes};
    use crate::packet::{HEADER_SIZE, PacketBuilder};
    use crate::select::Selection;

    fn two_packets() -> Vec<u8> {
        let mut buf = Vec::new();
        PacketBuilder::new(0)
            .payload(&[1, 2, 3, 4])
            .write_to(&mut buf)
            .unwrap();
        PacketBuilder::new(1)
            .payload(&[5, 6, 7, 8])
            .write_to(&mut buf)
            .unwrap();
        buf
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn payload_only_concatenates_payloads() {
        let mut out = Vec::new();
        let n = extract_bytes(&two_packets(), &Selection::All, ExtractParts::PAYLOAD, &mut out)
            .unwrap();
        assert_eq!(n, 8);
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn header_only_writes_eight_bytes_per_packet() {
        let input = two_packets();
        let mut out = Vec::new();
        let selection = Selection::Indices(vec![1, 0, 1]);
        let n = extract_bytes(&input, &selection, ExtractParts::HEADER, &mut out).unwrap();
        assert_eq!(n, 3 * HEADER_SIZE as u64);
        assert_eq!(&out[..8], &input[12..20]);
        assert_eq!(&out[8..16], &input[..8]);
    }

    #[test]
    fn both_parts_reproduce_input() {
        let input = two_packets();
        let mut out = Vec::new();
        let n = extract_bytes(&input, &Selection::All, ExtractParts::BOTH, &mut out).unwrap();
        assert_eq!(n, input.len() as u64);
        assert_eq!(out, input);
    }

    #[test]
    fn no_parts_writes_nothing() {
        let mut out = Vec::new();
        let selection = Selection::Indices(vec![0, 1, 1, 0]);
        let n = extract_bytes(&two_packets(), &selection, ExtractParts::default(), &mut out)
            .unwrap();
        assert_eq!(n, 0);
        assert!(out.is_empty());
        assert!(ExtractParts::default().is_empty());
    }

    #[test]
    fn bad_index_leaves_sink_untouched() {
        let mut out = Vec::new();
        let selection = Selection::Indices(vec![0, 2]);
        let err = extract_bytes(&two_packets(), &selection, ExtractParts::BOTH, &mut out)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Select(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn framing_error_leaves_sink_untouched() {
        let mut input = two_packets();
        input.push(0xfd);
        let mut out = Vec::new();
        let err = extract_bytes(&input, &Selection::All, ExtractParts::BOTH, &mut out)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Framing(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn sink_failure_is_reported() {
        let err = extract_bytes(
            &two_packets(),
            &Selection::All,
            ExtractParts::PAYLOAD,
            &mut FailingSink,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
