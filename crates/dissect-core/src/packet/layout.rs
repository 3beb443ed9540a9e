//! Wire layout of the fixed packet header (big-endian).

pub const HEADER_SIZE: usize = 8;

pub const VERSION_RANGE: std::ops::Range<usize> = 0..2;
pub const LENGTH_RANGE: std::ops::Range<usize> = 2..4;
pub const CHECKSUM_RANGE: std::ops::Range<usize> = 4..6;
pub const FLAGS_OFFSET: usize = 6;
pub const ID_OFFSET: usize = 7;

/// Version value every well-formed header carries.
pub const PROTOCOL_VERSION: u16 = 0xFD3F;

/// Largest packet the 16-bit length field can describe.
pub const MAX_PACKET_SIZE: usize = u16::MAX as usize;
pub const MAX_PAYLOAD_SIZE: usize = MAX_PACKET_SIZE - HEADER_SIZE;

pub const MORE_DATA_BIT: u8 = 1 << 7;
