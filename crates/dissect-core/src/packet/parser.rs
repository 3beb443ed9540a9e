use bitflags::bitflags;

use crate::checksum::Checksum;

use super::error::DecodeError;
use super::layout;
use super::reader::HeaderReader;

bitflags! {
    /// Header flags. Unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// The sender has more data following this packet.
        const MORE_DATA = layout::MORE_DATA_BIT;
    }
}

impl Flags {
    /// Bits set that carry no defined meaning.
    pub fn reserved(self) -> u8 {
        self.bits() & !Self::all().bits()
    }
}

/// The five header fields, without any derived data.
///
/// # Examples
/// ```
/// use dissect_core::packet::{Flags, HeaderFields, PROTOCOL_VERSION};
///
/// let fields = HeaderFields {
///     version: PROTOCOL_VERSION,
///     length: 12,
///     checksum: 0xbeef,
///     flags: Flags::MORE_DATA,
///     id: 3,
/// };
/// let raw = fields.encode();
/// assert_eq!(HeaderFields::decode(&raw)?, fields);
/// # Ok::<(), dissect_core::packet::DecodeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFields {
    pub version: u16,
    /// Total packet size, header included.
    pub length: u16,
    pub checksum: u16,
    pub flags: Flags,
    /// Sequence tag.
    pub id: u8,
}

impl HeaderFields {
    /// Decode the fields from the first [`HEADER_SIZE`](layout::HEADER_SIZE)
    /// bytes of `window`.
    ///
    /// # Errors
    /// Returns `DecodeError::TruncatedHeader` when `window` holds fewer than
    /// eight bytes.
    pub fn decode(window: &[u8]) -> Result<Self, DecodeError> {
        decode_fields(&HeaderReader::new(window))
    }

    pub fn encode(&self) -> [u8; layout::HEADER_SIZE] {
        let mut raw = [0u8; layout::HEADER_SIZE];
        raw[layout::VERSION_RANGE].copy_from_slice(&self.version.to_be_bytes());
        raw[layout::LENGTH_RANGE].copy_from_slice(&self.length.to_be_bytes());
        raw[layout::CHECKSUM_RANGE].copy_from_slice(&self.checksum.to_be_bytes());
        raw[layout::FLAGS_OFFSET] = self.flags.bits();
        raw[layout::ID_OFFSET] = self.id;
        raw
    }

    /// Payload size implied by `length`, or `None` when `length` cannot even
    /// hold the header.
    pub fn payload_length(&self) -> Option<usize> {
        usize::from(self.length).checked_sub(layout::HEADER_SIZE)
    }
}

fn decode_fields(reader: &HeaderReader<'_>) -> Result<HeaderFields, DecodeError> {
    reader.require_len(layout::HEADER_SIZE)?;

    Ok(HeaderFields {
        version: reader.read_u16_be(layout::VERSION_RANGE)?,
        length: reader.read_u16_be(layout::LENGTH_RANGE)?,
        checksum: reader.read_u16_be(layout::CHECKSUM_RANGE)?,
        flags: Flags::from_bits_retain(reader.read_u8(layout::FLAGS_OFFSET)?),
        id: reader.read_u8(layout::ID_OFFSET)?,
    })
}

/// A decoded header together with its raw bytes and the checksum its packet
/// should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    fields: HeaderFields,
    raw: [u8; layout::HEADER_SIZE],
    checksum_expected: u16,
}

impl Header {
    /// Decode the header at the start of `window`.
    ///
    /// The expected checksum covers the header and the payload bytes up to
    /// the declared length. Bytes past the declared length are never read,
    /// so passing the remainder of a stream gives the same result as passing
    /// the packet alone.
    ///
    /// # Errors
    /// Returns `DecodeError::TruncatedHeader` when `window` holds fewer than
    /// eight bytes.
    pub fn decode(window: &[u8]) -> Result<Self, DecodeError> {
        let reader = HeaderReader::new(window);
        let fields = decode_fields(&reader)?;
        let raw = reader.read_raw_header()?;
        let checksum_expected = expected_checksum(&raw, reader.payload_within(fields.length));

        Ok(Self {
            fields,
            raw,
            checksum_expected,
        })
    }

    pub fn fields(&self) -> &HeaderFields {
        &self.fields
    }

    pub fn version(&self) -> u16 {
        self.fields.version
    }

    pub fn length(&self) -> u16 {
        self.fields.length
    }

    pub fn checksum(&self) -> u16 {
        self.fields.checksum
    }

    pub fn flags(&self) -> Flags {
        self.fields.flags
    }

    pub fn id(&self) -> u8 {
        self.fields.id
    }

    /// The header exactly as transmitted.
    pub fn raw(&self) -> &[u8; layout::HEADER_SIZE] {
        &self.raw
    }

    pub fn checksum_expected(&self) -> u16 {
        self.checksum_expected
    }

    pub fn version_valid(&self) -> bool {
        self.fields.version == layout::PROTOCOL_VERSION
    }

    pub fn checksum_valid(&self) -> bool {
        self.fields.checksum == self.checksum_expected
    }
}

/// Checksum of a packet: its header with the checksum field zeroed,
/// followed by its payload.
///
/// # Examples
/// ```
/// use dissect_core::checksum::checksum;
/// use dissect_core::packet::expected_checksum;
///
/// let header = [0xfd, 0x3f, 0x00, 0x0a, 0xaa, 0xbb, 0x00, 0x00];
/// let zeroed = [0xfd, 0x3f, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02];
/// assert_eq!(expected_checksum(&header, &[0x01, 0x02]), checksum(&zeroed));
/// ```
pub fn expected_checksum(raw_header: &[u8; layout::HEADER_SIZE], payload: &[u8]) -> u16 {
    let mut acc = Checksum::new();
    acc.update(&raw_header[..layout::CHECKSUM_RANGE.start]);
    acc.update(&[0, 0]);
    acc.update(&raw_header[layout::CHECKSUM_RANGE.end..]);
    acc.update(payload);
    acc.finalize()
}

/// One framed packet: a header and the payload it declares.
///
/// The payload borrows from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<'a> {
    offset: usize,
    header: Header,
    payload: &'a [u8],
}

impl<'a> Packet<'a> {
    pub(crate) fn new(offset: usize, header: Header, payload: &'a [u8]) -> Self {
        Self {
            offset,
            header,
            payload,
        }
    }

    /// Byte offset of the header within the input buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Total packet size in bytes (header included).
    pub fn size(&self) -> usize {
        layout::HEADER_SIZE + self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Flags, Header, HeaderFields, expected_checksum};
    use crate::checksum::{checksum, verify};
    use crate::packet::PacketBuilder;
    use crate::packet::error::DecodeError;
    use crate::packet::layout;

    fn sample_fields() -> HeaderFields {
        HeaderFields {
            version: layout::PROTOCOL_VERSION,
            length: 12,
            checksum: 0x1234,
            flags: Flags::empty(),
            id: 0,
        }
    }

    #[test]
    fn encode_uses_big_endian_layout() {
        let raw = sample_fields().encode();
        assert_eq!(raw, [0xfd, 0x3f, 0x00, 0x0c, 0x12, 0x34, 0x00, 0x00]);
    }

    #[test]
    fn fields_round_trip() {
        let cases = [
            sample_fields(),
            HeaderFields {
                version: 0,
                length: u16::MAX,
                checksum: 0xffff,
                flags: Flags::from_bits_retain(0xff),
                id: 0xff,
            },
            HeaderFields {
                version: 0x0102,
                length: 0,
                checksum: 0,
                flags: Flags::MORE_DATA,
                id: 7,
            },
        ];
        for fields in cases {
            assert_eq!(HeaderFields::decode(&fields.encode()).unwrap(), fields);
        }
    }

    #[test]
    fn decode_rejects_short_window() {
        let err = HeaderFields::decode(&[0xfd, 0x3f, 0x00]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedHeader {
                needed: 8,
                actual: 3
            }
        );
        assert!(Header::decode(&[]).is_err());
    }

    #[test]
    fn flags_keep_reserved_bits() {
        let flags = Flags::from_bits_retain(0b1000_0101);
        assert!(flags.contains(Flags::MORE_DATA));
        assert_eq!(flags.reserved(), 0b0000_0101);
        assert_eq!(Flags::MORE_DATA.reserved(), 0);
    }

    #[test]
    fn header_keeps_raw_bytes() {
        let raw = sample_fields().encode();
        let header = Header::decode(&raw).unwrap();
        assert_eq!(header.raw(), &raw);
        assert_eq!(header.length(), 12);
        assert!(header.version_valid());
    }

    #[test]
    fn expected_checksum_ignores_checksum_field() {
        let mut fields = sample_fields();
        let payload = [1, 2, 3, 4];
        let a = expected_checksum(&fields.encode(), &payload);
        fields.checksum = 0xabcd;
        let b = expected_checksum(&fields.encode(), &payload);
        assert_eq!(a, b);
    }

    #[test]
    fn expected_checksum_verifies_over_zeroed_packet() {
        let mut fields = sample_fields();
        fields.checksum = 0;
        let payload = [9, 8, 7, 6];
        let mut bytes = fields.encode().to_vec();
        bytes.extend_from_slice(&payload);

        let sum = expected_checksum(&fields.encode(), &payload);
        assert_eq!(sum, checksum(&bytes));
        assert!(verify(&bytes, sum));
    }

    #[test]
    fn transmitted_packet_is_not_self_verifying() {
        let wire = PacketBuilder::new(0).payload(&[1, 2, 3, 4]).build().unwrap();
        let header = Header::decode(&wire).unwrap();
        assert!(header.checksum_valid());
        assert_eq!(header.checksum(), 0xadfe);

        // Big-endian field summed as a little-endian word.
        assert_eq!(checksum(&wire), 0xaf50);
        assert!(!verify(&wire, 0));

        let mut zeroed = wire.clone();
        zeroed[layout::CHECKSUM_RANGE].fill(0);
        assert!(verify(&zeroed, header.checksum()));

        let mut swapped = zeroed;
        swapped[layout::CHECKSUM_RANGE].copy_from_slice(&header.checksum().to_le_bytes());
        assert!(verify(&swapped, 0));
    }

    #[test]
    fn header_checksum_stops_at_declared_length() {
        let mut fields = sample_fields();
        fields.checksum = 0;
        let mut packet = fields.encode().to_vec();
        packet.extend_from_slice(&[1, 2, 3, 4]);
        fields.checksum = expected_checksum(&fields.encode(), &[1, 2, 3, 4]);
        packet[layout::CHECKSUM_RANGE].copy_from_slice(&fields.checksum.to_be_bytes());

        let alone = Header::decode(&packet).unwrap();
        let mut stream = packet.clone();
        stream.extend_from_slice(&[0xaa; 32]);
        let in_stream = Header::decode(&stream).unwrap();

        assert!(alone.checksum_valid());
        assert_eq!(alone.checksum_expected(), in_stream.checksum_expected());
    }

    #[test]
    fn payload_length_requires_header() {
        assert_eq!(sample_fields().payload_length(), Some(4));
        let fields = HeaderFields {
            length: 7,
            ..sample_fields()
        };
        assert_eq!(fields.payload_length(), None);
    }
}
