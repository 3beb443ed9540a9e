//! Packet framing.
//!
//! The decoder follows a layered structure:
//! - `layout`: byte offsets and protocol constants (source of truth)
//! - `reader`: bounds-checked byte access
//! - `parser`: header and packet types, checksum scope
//! - `segment`: splitting a buffer into packets
//! - `builder`: encoding packets with valid length and checksum
//! - `error`: explicit, actionable errors
//!
//! Decoding is pure and contains no I/O. A packet's checksum covers its own
//! header (checksum field zeroed) and payload, and never the bytes of the
//! packets that follow it.

pub mod builder;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod segment;

pub use builder::PacketBuilder;
pub use error::{DecodeError, EncodeError, FramingError};
pub use layout::{HEADER_SIZE, MAX_PACKET_SIZE, PROTOCOL_VERSION};
pub use parser::{Flags, Header, HeaderFields, Packet, expected_checksum};
pub use segment::segment;
