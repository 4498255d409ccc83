//! Builder for creating and preallocating the destination file.

use std::fs::File;
use std::io;
use std::path::Path;

use super::writer::StorageWriter;
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::os::unix::io::AsRawFd;

/// Builder for a destination file. Call `preallocate` (optional) then `build` to
/// get a `StorageWriter` that supports concurrent positional writes.
pub struct StorageWriterBuilder {
    file: File,
}

impl StorageWriterBuilder {
    /// Create the file at `path`, truncating it if it already exists.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(StorageWriterBuilder { file })
    }

    /// Size the file to exactly `size` bytes so chunks can land in any order.
    /// On Linux tries `posix_fallocate` for real block allocation; falls back to `set_len`.
    pub fn preallocate(&mut self, size: u64) -> io::Result<()> {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file.set_len(size)
    }

    pub fn build(self) -> StorageWriter {
        StorageWriter::from_file(self.file)
    }
}
