use thiserror::Error;

/// Errors returned by header decoding.
///
/// # Examples
/// ```
/// use dissect_core::packet::DecodeError;
///
/// let err = DecodeError::TruncatedHeader { needed: 8, actual: 3 };
/// assert!(err.to_string().contains("truncated header"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated header: need {needed} bytes, got {actual}")]
    TruncatedHeader { needed: usize, actual: usize },
}

/// Errors returned by stream segmentation.
///
/// Every variant carries the index of the packet being framed and the byte
/// offset of its header within the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("packet #{index} at offset {offset}: {source}")]
    Truncated {
        index: usize,
        offset: usize,
        #[source]
        source: DecodeError,
    },
    #[error(
        "packet #{index} at offset {offset}: declared length {declared} is smaller than the {minimum}-byte header"
    )]
    LengthTooSmall {
        index: usize,
        offset: usize,
        declared: u16,
        minimum: usize,
    },
    #[error(
        "packet #{index} at offset {offset}: declared length {declared} exceeds the {available} remaining bytes"
    )]
    LengthOverrun {
        index: usize,
        offset: usize,
        declared: u16,
        available: usize,
    },
}

impl FramingError {
    /// Index of the packet that could not be framed.
    pub fn index(&self) -> usize {
        match self {
            FramingError::Truncated { index, .. }
            | FramingError::LengthTooSmall { index, .. }
            | FramingError::LengthOverrun { index, .. } => *index,
        }
    }

    /// Byte offset of the malformed header.
    pub fn offset(&self) -> usize {
        match self {
            FramingError::Truncated { offset, .. }
            | FramingError::LengthTooSmall { offset, .. }
            | FramingError::LengthOverrun { offset, .. } => *offset,
        }
    }
}

/// Errors returned when encoding a packet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("payload too large: {size} bytes, at most {max} fit in one packet")]
    PayloadTooLarge { size: usize, max: usize },
}
