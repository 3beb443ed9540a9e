//! Input sources.
//!
//! A source hands the whole input to the analysis layer as one in-memory
//! buffer; decoding never touches I/O.

mod file;

pub use file::FileSource;

use std::io::Read;

use thiserror::Error;

/// A readable byte source.
pub trait ByteSource {
    /// Read the remaining input to the end.
    fn read_all(&mut self) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any `Read` implementation, e.g. standard input or an in-memory cursor.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use dissect_core::{ByteSource, ReaderSource};
///
/// let mut source = ReaderSource::new(Cursor::new(vec![1, 2, 3]));
/// assert_eq!(source.read_all()?, vec![1, 2, 3]);
/// # Ok::<(), dissect_core::SourceError>(())
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_all(&mut self) -> Result<Vec<u8>, SourceError> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_all(&mut self) -> Result<Vec<u8>, SourceError> {
        (**self).read_all()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};

    use super::{ByteSource, ReaderSource, SourceError};

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn reader_source_reads_to_end() {
        let mut source = ReaderSource::new(&b"\xfd\x3f\x00\x08"[..]);
        assert_eq!(source.read_all().unwrap(), vec![0xfd, 0x3f, 0x00, 0x08]);
        assert!(source.read_all().unwrap().is_empty());
    }

    #[test]
    fn reader_errors_surface_as_io() {
        let err = ReaderSource::new(BrokenReader).read_all().unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }
}
