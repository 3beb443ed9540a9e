use tracing::{debug, trace};

use super::error::FramingError;
use super::layout;
use super::parser::{Header, Packet};

/// Split `buf` into the packets it contains, in stream order.
///
/// Each header's declared length decides where the next packet starts. The
/// whole sequence is materialized before returning; on error no packets are
/// returned at all.
///
/// # Errors
/// Returns `FramingError` when fewer than eight bytes remain for a header,
/// when a declared length is smaller than the header, or when it runs past
/// the end of `buf`.
///
/// # Examples
/// ```
/// use dissect_core::packet::{FramingError, PacketBuilder, segment};
///
/// let mut buf = PacketBuilder::new(0).payload(&[1, 2, 3, 4]).build()?;
/// assert_eq!(segment(&buf)?.len(), 1);
///
/// buf.extend_from_slice(&[0xfd, 0x3f, 0x00]);
/// let err = segment(&buf).unwrap_err();
/// assert!(matches!(err, FramingError::Truncated { index: 1, offset: 12, .. }));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn segment(buf: &[u8]) -> Result<Vec<Packet<'_>>, FramingError> {
    let mut packets = Vec::new();
    let mut offset = 0usize;

    while offset < buf.len() {
        let packet = frame_at(buf, offset, packets.len())?;
        trace!(
            index = packets.len(),
            offset,
            length = packet.size(),
            id = packet.header().id(),
            "framed packet"
        );
        offset += packet.size();
        packets.push(packet);
    }

    debug!(packets = packets.len(), bytes = buf.len(), "segmented stream");
    Ok(packets)
}

fn frame_at(buf: &[u8], offset: usize, index: usize) -> Result<Packet<'_>, FramingError> {
    let window = &buf[offset..];
    let header = Header::decode(window).map_err(|source| FramingError::Truncated {
        index,
        offset,
        source,
    })?;

    let declared = header.length();
    let length = usize::from(declared);
    if length < layout::HEADER_SIZE {
        return Err(FramingError::LengthTooSmall {
            index,
            offset,
            declared,
            minimum: layout::HEADER_SIZE,
        });
    }
    if length > window.len() {
        return Err(FramingError::LengthOverrun {
            index,
            offset,
            declared,
            available: window.len(),
        });
    }

    let payload = &window[layout::HEADER_SIZE..length];
    Ok(Packet::new(offset, header, payload))
}
