use super::error::EncodeError;
use super::layout;
use super::parser::{Flags, HeaderFields, expected_checksum};

/// Encodes a complete packet with a correct length and checksum.
///
/// `length` and `checksum` can be overridden to produce malformed packets.
///
/// # Examples
/// ```
/// use dissect_core::packet::{PacketBuilder, segment};
///
/// let mut stream = PacketBuilder::new(0).payload(&[1, 2, 3, 4]).build()?;
/// PacketBuilder::new(1).payload(b"next").write_to(&mut stream)?;
///
/// let packets = segment(&stream)?;
/// assert_eq!(packets.len(), 2);
/// assert!(packets.iter().all(|p| p.header().checksum_valid()));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PacketBuilder<'a> {
    version: u16,
    flags: Flags,
    id: u8,
    payload: &'a [u8],
    length: Option<u16>,
    checksum: Option<u16>,
}

impl<'a> PacketBuilder<'a> {
    pub fn new(id: u8) -> Self {
        Self {
            version: layout::PROTOCOL_VERSION,
            flags: Flags::empty(),
            id,
            payload: &[],
            length: None,
            checksum: None,
        }
    }

    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn payload(mut self, payload: &'a [u8]) -> Self {
        self.payload = payload;
        self
    }

    /// Declare `length` instead of the real packet size.
    pub fn length(mut self, length: u16) -> Self {
        self.length = Some(length);
        self
    }

    /// Transmit `checksum` instead of the computed one.
    pub fn checksum(mut self, checksum: u16) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// Header fields as they will be transmitted.
    ///
    /// # Errors
    /// Returns `EncodeError::PayloadTooLarge` when the payload does not fit
    /// in the 16-bit length field.
    pub fn fields(&self) -> Result<HeaderFields, EncodeError> {
        if self.payload.len() > layout::MAX_PAYLOAD_SIZE {
            return Err(EncodeError::PayloadTooLarge {
                size: self.payload.len(),
                max: layout::MAX_PAYLOAD_SIZE,
            });
        }
        let size = (layout::HEADER_SIZE + self.payload.len()) as u16;

        let mut fields = HeaderFields {
            version: self.version,
            length: self.length.unwrap_or(size),
            checksum: 0,
            flags: self.flags,
            id: self.id,
        };
        fields.checksum = self
            .checksum
            .unwrap_or_else(|| expected_checksum(&fields.encode(), self.payload));
        Ok(fields)
    }

    /// Append the encoded packet to `out`.
    ///
    /// # Errors
    /// See [`PacketBuilder::fields`].
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let fields = self.fields()?;
        out.extend_from_slice(&fields.encode());
        out.extend_from_slice(self.payload);
        Ok(())
    }

    /// Encode the packet into a new buffer.
    ///
    /// # Errors
    /// See [`PacketBuilder::fields`].
    pub fn build(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(layout::HEADER_SIZE + self.payload.len());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::PacketBuilder;
    use crate::packet::error::EncodeError;
    use crate::packet::layout;
    use crate::packet::parser::{Flags, Header};

    #[test]
    fn build_sets_length_and_checksum() {
        let bytes = PacketBuilder::new(4)
            .flags(Flags::MORE_DATA)
            .payload(&[0xaa, 0xbb, 0xcc])
            .build()
            .unwrap();
        assert_eq!(bytes.len(), 11);

        let header = Header::decode(&bytes).unwrap();
        assert_eq!(header.length(), 11);
        assert_eq!(header.id(), 4);
        assert!(header.flags().contains(Flags::MORE_DATA));
        assert!(header.version_valid());
        assert!(header.checksum_valid());
    }

    #[test]
    fn overrides_are_transmitted_verbatim() {
        let bytes = PacketBuilder::new(0)
            .version(0x0001)
            .length(3)
            .checksum(0xdead)
            .build()
            .unwrap();
        let header = Header::decode(&bytes).unwrap();
        assert_eq!(header.version(), 0x0001);
        assert_eq!(header.length(), 3);
        assert_eq!(header.checksum(), 0xdead);
        assert!(!header.version_valid());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; layout::MAX_PAYLOAD_SIZE + 1];
        let err = PacketBuilder::new(0).payload(&payload).build().unwrap_err();
        assert!(matches!(err, EncodeError::PayloadTooLarge { .. }));
    }

    #[test]
    fn largest_payload_fits() {
        let payload = vec![0u8; layout::MAX_PAYLOAD_SIZE];
        let bytes = PacketBuilder::new(0).payload(&payload).build().unwrap();
        assert_eq!(bytes.len(), layout::MAX_PACKET_SIZE);
    }
}
