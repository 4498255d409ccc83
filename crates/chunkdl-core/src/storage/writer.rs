//! Positional writers over the shared destination file.

use std::fs::File;
use std::io;
use std::sync::Arc;

/// Shared handle on the destination file. Cheap to clone; every write is
/// positional (pwrite-style) and never touches the file's cursor.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
}

impl StorageWriter {
    pub(crate) fn from_file(file: File) -> Self {
        Self {
            file: Arc::new(file),
        }
    }

    /// One positional write of `data` at `offset`. Returns the bytes actually written,
    /// which may be fewer than `data.len()`.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.write_at(data, offset)
    }

    #[cfg(windows)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_write(data, offset)
    }

    /// Flushes data and metadata to disk.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// Sequential `io::Write` view of a `StorageWriter` starting at a fixed offset.
///
/// Each chunk gets its own instance seeded with the chunk start; the logical
/// offset advances by exactly the bytes each write reports.
pub struct OffsetWriter {
    storage: StorageWriter,
    offset: u64,
}

impl OffsetWriter {
    pub fn new(storage: StorageWriter, offset: u64) -> Self {
        Self { storage, offset }
    }

    #[cfg(test)]
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }
}

impl io::Write for OffsetWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.storage.write_at(self.offset, buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
