use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{ByteSource, SourceError};

/// Input read from a file on disk.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: File,
}

impl FileSource {
    /// Open `path` for reading.
    ///
    /// # Errors
    /// Returns `SourceError::Io` when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn read_all(&mut self) -> Result<Vec<u8>, SourceError> {
        let mut buf = match self.file.metadata() {
            Ok(meta) => Vec::with_capacity(usize::try_from(meta.len()).unwrap_or(0)),
            Err(_) => Vec::new(),
        };
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}
